//! Security probe hook.
//!
//! The engine never attacks the target itself. A caller may supply a probe
//! that runs after the core interview; its findings attach to the matching
//! tool records as security fingerprints and touch nothing else.

use async_trait::async_trait;
use bellwether_baseline::ToolDescriptor;
use bellwether_fingerprint::SecurityFingerprint;
use bellwether_transport::Session;

/// An external security prober.
#[async_trait]
pub trait SecurityProbe: Send + Sync {
    /// Examines one tool over the live session. Returning `None` leaves the
    /// tool's security fingerprint untouched.
    async fn probe(
        &self,
        session: &dyn Session,
        tool: &ToolDescriptor,
    ) -> Option<SecurityFingerprint>;
}
