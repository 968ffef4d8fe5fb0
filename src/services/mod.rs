pub mod brewery_commands;
pub mod brewery_service;
pub mod image_store;
pub mod slug;
