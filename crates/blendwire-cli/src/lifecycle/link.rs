//! What the supervisor needs from the automation server.

use blendwire_rpc::{Backoff, RpcClient, RpcError, is_healthy};
use serde_json::{Value, json};

/// Remote action used to ask the host to quit.
pub const QUIT_ACTION: &str = "execute";

/// Script run inside the host to quit it.
pub const QUIT_SCRIPT: &str = "import bpy; bpy.ops.wm.quit_blender()";

/// Server-side view of the host: health and a polite quit.
#[cfg_attr(test, mockall::automock)]
pub trait HostLink {
    /// One health check; any failure reads as unhealthy.
    fn is_healthy(&self) -> bool;

    /// Checks with backoff until healthy or out of attempts.
    fn wait_until_healthy(&self, backoff: Backoff) -> Result<bool, RpcError>;

    /// Asks the host to quit through the server.
    fn request_quit(&self) -> Result<Value, RpcError>;
}

impl HostLink for RpcClient {
    fn is_healthy(&self) -> bool {
        self.health().is_ok_and(|body| is_healthy(&body))
    }

    fn wait_until_healthy(&self, backoff: Backoff) -> Result<bool, RpcError> {
        self.ping_with_backoff(backoff.max_attempts(), backoff.base_delay())
    }

    fn request_quit(&self) -> Result<Value, RpcError> {
        self.command(QUIT_ACTION, &json!({ "code": QUIT_SCRIPT }))
    }
}
