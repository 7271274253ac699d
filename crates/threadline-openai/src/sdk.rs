//! The upstream SDK surface, as seen by the proxy
//!
//! An SDK is a tree of objects. Each object exposes named members that are
//! either callable methods, nested objects, or plain values. Methods take a
//! JSON request and produce either a complete JSON result or a live stream
//! of JSON chunks.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Live stream of chunks produced by a streaming call
pub type ChunkStream = BoxStream<'static, anyhow::Result<Value>>;

/// What a method call produced
pub enum Output {
    Response(Value),
    Stream(ChunkStream),
}

impl Output {
    pub fn into_response(self) -> Option<Value> {
        match self {
            Output::Response(value) => Some(value),
            Output::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<ChunkStream> {
        match self {
            Output::Stream(stream) => Some(stream),
            Output::Response(_) => None,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Response(value) => f.debug_tuple("Response").field(value).finish(),
            Output::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A callable SDK member, already bound to its receiver
#[async_trait]
pub trait SdkMethod: Send + Sync {
    async fn call(&self, request: Value) -> anyhow::Result<Output>;
}

/// An SDK object with named members
pub trait SdkObject: Send + Sync {
    /// Type name used in default trace names, e.g. `OpenAI` or `Completions`
    fn type_name(&self) -> &str;

    /// Look up a member by name.
    fn member(&self, name: &str) -> Option<Member>;
}

/// One member of an SDK object
#[derive(Clone)]
pub enum Member {
    Method(Arc<dyn SdkMethod>),
    Object(Arc<dyn SdkObject>),
    Value(Value),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Method(_) => f.write_str("Method(..)"),
            Member::Object(object) => write!(f, "Object({})", object.type_name()),
            Member::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Convenience navigation over [`SdkObject`] trees
#[async_trait]
pub trait SdkObjectExt: SdkObject {
    /// Resolve a dotted path such as `chat.completions.create`.
    fn resolve(&self, path: &str) -> Option<Member> {
        let mut segments = path.split('.');
        let mut current = self.member(segments.next()?)?;

        for segment in segments {
            current = match current {
                Member::Object(object) => object.member(segment)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Call the method at a dotted path.
    async fn call(&self, path: &str, request: Value) -> anyhow::Result<Output> {
        match self.resolve(path) {
            Some(Member::Method(method)) => method.call(request).await,
            Some(other) => Err(anyhow::anyhow!("'{}' is not a method: {:?}", path, other)),
            None => Err(anyhow::anyhow!("No member at '{}'", path)),
        }
    }
}

impl<T: SdkObject + ?Sized> SdkObjectExt for T {}
