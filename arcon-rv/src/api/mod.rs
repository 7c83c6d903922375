//! HTTP API handlers for arcon-rv

pub mod buildinfo;
pub mod health;
pub mod history;
pub mod proxy;
pub mod sessions;
pub mod submit;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use history::{first_attempt_history, latest_history, resolve_clip};
pub use proxy::proxy_update;
pub use sessions::{
    close_session, get_entry, get_session, get_view_state, open_session, put_view_state,
    remove_override, set_override, toggle_regen, toggle_remake_all,
};
pub use submit::{submit_session, validate_session};
