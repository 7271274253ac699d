//! Recursive, lazy wrapping of SDK object trees

use crate::context::ObserveConfig;
use crate::interceptor::TracedMethod;
use crate::sdk::{Member, Output, SdkMethod, SdkObject};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use threadline_client::resolve_sink;
use threadline_core::{Result, TraceSink};

/// Member name that flushes the trace sink
pub const FLUSH_MEMBER: &str = "flush";
/// Member name that shuts the trace sink down
pub const SHUTDOWN_MEMBER: &str = "shutdown";

/// An SDK object whose methods are traced.
///
/// Members are wrapped when they are looked up, never ahead of time, and
/// nothing touches the trace sink until a method is actually called.
#[derive(Clone)]
pub struct ObservedObject {
    inner: Arc<dyn SdkObject>,
    config: ObserveConfig,
}

impl ObservedObject {
    pub fn new(inner: Arc<dyn SdkObject>, config: ObserveConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped object
    pub fn inner(&self) -> &Arc<dyn SdkObject> {
        &self.inner
    }

    pub fn config(&self) -> &ObserveConfig {
        &self.config
    }

    /// Wait for every trace write issued so far to settle.
    pub async fn flush(&self) -> Result<()> {
        self.sink()?.flush().await;
        Ok(())
    }

    /// Flush, then release the sink's resources.
    pub async fn shutdown(&self) -> Result<()> {
        self.sink()?.shutdown().await;
        Ok(())
    }

    fn sink(&self) -> Result<Arc<dyn TraceSink>> {
        resolve_sink(self.config.parent.as_ref())
    }
}

impl SdkObject for ObservedObject {
    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn member(&self, name: &str) -> Option<Member> {
        if let Some(action) = Lifecycle::from_name(name) {
            return Some(Member::Method(Arc::new(LifecycleMethod {
                action,
                config: self.config.clone(),
            })));
        }

        let context = self.config.for_member(self.inner.type_name(), name);
        let member = match self.inner.member(name)? {
            Member::Method(method) => Member::Method(Arc::new(TracedMethod::new(method, context))),
            Member::Object(object) => Member::Object(Arc::new(ObservedObject::new(object, context))),
            value @ Member::Value(_) => value,
        };
        Some(member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Flush,
    Shutdown,
}

impl Lifecycle {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            FLUSH_MEMBER => Some(Self::Flush),
            SHUTDOWN_MEMBER => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// `flush` / `shutdown` reached through member lookup.
///
/// The sink is resolved when called, so the default sink is not built just
/// because the member was looked up.
struct LifecycleMethod {
    action: Lifecycle,
    config: ObserveConfig,
}

#[async_trait]
impl SdkMethod for LifecycleMethod {
    async fn call(&self, _request: Value) -> anyhow::Result<Output> {
        let sink = resolve_sink(self.config.parent.as_ref())?;
        match self.action {
            Lifecycle::Flush => sink.flush().await,
            Lifecycle::Shutdown => sink.shutdown().await,
        }
        Ok(Output::Response(Value::Null))
    }
}
