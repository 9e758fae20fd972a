//! Download item CRUD, split by read and write.

mod read;
mod write;
