pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod csrf;
}

pub mod scheduling {
    pub mod calendar;
    pub mod resolver;
}

pub mod models {
    pub mod auth_session;
    pub mod availability;
    pub mod feedback;
    pub mod request;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod availability;
    pub mod feedback;
    pub mod memory;
    pub mod request;
    pub mod session;
    pub mod store;
    pub mod user;
}

pub mod services {
    pub mod admin;
    pub mod auth;
    pub mod booking;
    pub mod requests;
    pub mod sessions;
    pub mod users;
}

pub mod handlers {
    pub mod admin;
    pub mod auth;
    pub mod availability;
    pub mod requests;
    pub mod response;
    pub mod sessions;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
    pub mod payload;
}
