//! # Voxel World
//!
//! Representation, generation and streaming of the chunked block grid.
//!
//! ## Architecture
//!
//! * **Block**: the closed catalog of block kinds and their static properties
//! * **Coordinates**: chunk, local and global voxel addressing
//! * **Noise field**: seeded coherent noise and per-chunk random streams
//! * **Generation**: the pure chunk generator (ores, terrain, trees, flora)
//! * **Chunk**: dense block storage plus incremental render instances
//! * **Edit store**: the in-memory overlay of player edits
//! * **Tasks**: chunk generation jobs for the worker pool
//! * **World**: owns the loaded chunks and streams them around the viewer
//!
//! ## Data Flow
//!
//! 1. The world computes the visible chunk set around the viewer
//! 2. Missing chunks are queued, nearest first, and dispatched one per update
//! 3. A worker runs the generator and sends the grid back
//! 4. The world overlays recorded edits and builds the chunk's instances
//! 5. Gameplay edits mutate the chunk and the edit store synchronously
//!
//! ## Thread Safety
//!
//! Only generation runs off the owning thread, on immutable snapshots of the
//! parameters and noise field. Chunks, instance buffers and the edit store are
//! only ever touched by the owning thread.

pub mod block;
pub mod chunk;
pub mod coordinates;
pub mod edit_store;
pub mod generation;
pub mod noise_field;
pub mod tasks;
pub mod world;
