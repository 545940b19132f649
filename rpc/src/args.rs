//! Typed, in-order access to decoded call parameters.

use std::net::SocketAddr;

use codec::{Value, Vec3};

use crate::error::{RpcError, RpcResult};

/// Reads call parameters front to back, failing on a missing slot or a
/// type other than the one asked for.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    method: &'a str,
    params: &'a [Value],
    index: usize,
}

impl<'a> Args<'a> {
    #[must_use]
    pub const fn new(method: &'a str, params: &'a [Value]) -> Self {
        Self {
            method,
            params,
            index: 0,
        }
    }

    fn next<T>(&mut self, extract: impl FnOnce(&'a Value) -> Option<T>) -> RpcResult<T> {
        let index = self.index;
        self.index += 1;
        self.params
            .get(index)
            .and_then(extract)
            .ok_or_else(|| RpcError::BadArgument {
                method: self.method.to_owned(),
                index,
            })
    }

    pub fn u8(&mut self) -> RpcResult<u8> {
        self.next(Value::as_u8)
    }

    pub fn u32(&mut self) -> RpcResult<u32> {
        self.next(Value::as_u32)
    }

    pub fn f32(&mut self) -> RpcResult<f32> {
        self.next(Value::as_f32)
    }

    pub fn vec3(&mut self) -> RpcResult<Vec3> {
        self.next(Value::as_vec3)
    }

    pub fn str(&mut self) -> RpcResult<&'a str> {
        self.next(Value::as_str)
    }

    pub fn bytes(&mut self) -> RpcResult<&'a [u8]> {
        self.next(Value::as_bytes)
    }

    /// A slot filled locally with the sender's address.
    pub fn connection(&mut self) -> RpcResult<SocketAddr> {
        self.next(Value::as_connection)
    }
}
