//! Scope RPC names and signatures.

use codec::{Signature, TypeTag};
use rpc::{MethodRegistry, RpcResult};

/// `(object, relationship, position, data)`, reliable.
pub const INSTANTIATE: &str = "Scope.Instantiate";
/// `(object, position, data)`, unreliable.
pub const SYNC: &str = "Scope.Sync";
/// `(object)`, reliable.
pub const DESTROY: &str = "Scope.Destroy";

/// Registers every scope method.
pub fn register_methods(methods: &mut MethodRegistry) -> RpcResult<()> {
    methods.register(
        INSTANTIATE,
        Signature::new([TypeTag::U32, TypeTag::U8, TypeTag::Vec3, TypeTag::Bytes]),
    )?;
    methods.register(
        SYNC,
        Signature::new([TypeTag::U32, TypeTag::Vec3, TypeTag::Bytes]),
    )?;
    methods.register(DESTROY, Signature::new([TypeTag::U32]))?;
    Ok(())
}
