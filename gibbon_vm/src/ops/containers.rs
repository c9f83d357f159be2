//! Array and hash construction, and indexing.

use crate::dispatch::ControlFlow;
use crate::error::VmResult;
use crate::vm::VirtualMachine;
use gibbon_runtime::{Value, ops};

/// Array: replace the top `count` values with an array of them
#[inline(always)]
pub fn build_array(vm: &mut VirtualMachine, count: usize) -> VmResult<ControlFlow> {
    let elements = vm.stack.take_top(count);
    vm.stack.push(Value::array(elements))?;
    Ok(ControlFlow::Continue)
}

/// Hash: replace the top `count` values (alternating key, value) with a hash
#[inline(always)]
pub fn build_hash(vm: &mut VirtualMachine, count: usize) -> VmResult<ControlFlow> {
    let mut values = vm.stack.take_top(count).into_iter();
    let pairs = std::iter::from_fn(|| Some((values.next()?, values.next()?)));
    let hash = Value::hash_from_pairs(pairs)?;
    vm.stack.push(hash)?;
    Ok(ControlFlow::Continue)
}

/// Index: push(collection[index])
#[inline(always)]
pub fn index(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    let index = vm.stack.pop();
    let collection = vm.stack.pop();
    let value = ops::index(&collection, &index)?;
    vm.stack.push(value)?;
    Ok(ControlFlow::Continue)
}
