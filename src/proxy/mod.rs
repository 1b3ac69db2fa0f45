//! Collaborators used by probers around the core: proxy config templating
//! and local port allocation

mod port;
mod template;

pub use port::allocate_free_port;
pub use template::{ProxyParams, render_config, write_config};
