pub mod thread_controller;
pub mod thread_index;
pub mod thread_model;
pub mod thread_service;
