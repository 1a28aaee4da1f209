//! Behaviour of the proxied class itself.

use super::instance::ProxyInstance;
use crate::descriptor::Value;

/// The original class's implementations, invoked after the proxy has run its
/// load trigger.
///
/// Magic hooks are only consulted when the class descriptor declares them.
/// `call` stands in for every intercepted method body; the default
/// implementations do nothing.
pub trait ParentHooks: Send + Sync {
    fn get(&self, _instance: &mut ProxyInstance, _name: &str) -> Option<Value> {
        None
    }

    fn set(&self, instance: &mut ProxyInstance, name: &str, value: Value) {
        instance.fill(name, value);
    }

    fn isset(&self, _instance: &ProxyInstance, _name: &str) -> bool {
        false
    }

    /// Property names the original `__sleep` serializes.
    fn sleep(&self, _instance: &ProxyInstance) -> Vec<String> {
        Vec::new()
    }

    fn wakeup(&self, _instance: &mut ProxyInstance) {}

    fn clone_hook(&self, _instance: &mut ProxyInstance) {}

    fn call(&self, _instance: &mut ProxyInstance, _method: &str, _args: &[Value]) -> Option<Value> {
        None
    }
}

/// A class without behaviour of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ParentHooks for NoHooks {}
