mod checkin;
mod common;
mod service;
