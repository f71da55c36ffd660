pub mod channel;
pub mod controller;
pub mod screen;
pub mod session;
pub mod transport;
pub mod view;
