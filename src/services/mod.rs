pub mod booking;
pub mod extraction;
pub mod messaging;
pub mod reminder;
pub mod slots;
