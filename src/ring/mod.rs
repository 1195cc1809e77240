pub mod buffer;
pub mod counted;
pub mod cursor;
pub mod ring_error;
pub mod spsc;

pub use buffer::ByteRing;
pub use counted::CountedRing;
pub use cursor::PointerRing;
pub use ring_error::*;
pub use spsc::*;
