pub mod catalog;
pub mod lifecycle;
pub mod notification;
pub mod pet;
pub mod vaccination;
