pub mod buffer;
pub mod note;
pub mod peak;
