pub mod autoplay;
pub mod catalog;
pub mod carousel;
pub mod details;
pub mod pagination;
pub mod providers;
pub mod request;
