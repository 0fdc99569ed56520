//! Typed field access to script instances.
//!
//! Every [`InstanceType`] tag has a schema naming the class members the engine reads. A view is
//! obtained through [`DaedalusVm::view`] or [`DaedalusVm::view_mut`], which refuse instances
//! allocated under a different tag. Views read and write the same storage the interpreter uses,
//! so changes are visible to scripts immediately.
//!
//! Members are looked up by name in the instance's class. Getters return zero or empty for
//! members the loaded script does not declare (game versions differ); setters fail with
//! `UnknownMember`. Every other failure, such as an index past the member's element count, is an
//! error for both.

use std::marker::PhantomData;

use crate::error::{Result, VmError};
use crate::vm::storage::{CellError, Storage};
use crate::vm::{DaedalusVm, InstanceHandle, InstanceType, ValueKind};

pub trait InstanceSchema {
    const TYPE: InstanceType;
}

/// Generates a schema marker plus typed accessors on both view types.
///
/// Each field is `getter / setter: kind = "MEMBER"` or, for arrays,
/// `getter / setter: kind[IndexType] = "MEMBER"`.
macro_rules! instance_schema {
    (@get $get:ident int $member:literal) => {
        pub fn $get(&self) -> $crate::error::Result<i32> {
            self.int($member, 0)
        }
    };
    (@get $get:ident int [$idx:ty] $member:literal) => {
        pub fn $get(&self, i: $idx) -> $crate::error::Result<i32> {
            self.int($member, i as usize)
        }
    };
    (@get $get:ident float $member:literal) => {
        pub fn $get(&self) -> $crate::error::Result<f32> {
            self.float($member, 0)
        }
    };
    (@get $get:ident float [$idx:ty] $member:literal) => {
        pub fn $get(&self, i: $idx) -> $crate::error::Result<f32> {
            self.float($member, i as usize)
        }
    };
    (@get $get:ident string $member:literal) => {
        pub fn $get(&self) -> $crate::error::Result<&str> {
            self.string($member, 0)
        }
    };
    (@get $get:ident string [$idx:ty] $member:literal) => {
        pub fn $get(&self, i: $idx) -> $crate::error::Result<&str> {
            self.string($member, i as usize)
        }
    };

    (@set $set:ident int $member:literal) => {
        pub fn $set(&mut self, value: i32) -> $crate::error::Result<()> {
            self.set_int($member, 0, value)
        }
    };
    (@set $set:ident int [$idx:ty] $member:literal) => {
        pub fn $set(&mut self, i: $idx, value: i32) -> $crate::error::Result<()> {
            self.set_int($member, i as usize, value)
        }
    };
    (@set $set:ident float $member:literal) => {
        pub fn $set(&mut self, value: f32) -> $crate::error::Result<()> {
            self.set_float($member, 0, value)
        }
    };
    (@set $set:ident float [$idx:ty] $member:literal) => {
        pub fn $set(&mut self, i: $idx, value: f32) -> $crate::error::Result<()> {
            self.set_float($member, i as usize, value)
        }
    };
    (@set $set:ident string $member:literal) => {
        pub fn $set(&mut self, value: impl Into<String>) -> $crate::error::Result<()> {
            self.set_string($member, 0, value)
        }
    };
    (@set $set:ident string [$idx:ty] $member:literal) => {
        pub fn $set(&mut self, i: $idx, value: impl Into<String>) -> $crate::error::Result<()> {
            self.set_string($member, i as usize, value)
        }
    };

    (
        $(#[$meta:meta])*
        pub struct $schema:ident => $tag:ident {
            $( $get:ident / $set:ident : $kind:ident $([$idx:ty])? = $member:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $schema;

        impl $crate::schema::InstanceSchema for $schema {
            const TYPE: $crate::vm::InstanceType = $crate::vm::InstanceType::$tag;
        }

        impl $crate::schema::InstanceView<'_, $schema> {
            $( instance_schema!(@get $get $kind $([$idx])? $member); )*
        }

        impl $crate::schema::InstanceViewMut<'_, $schema> {
            $( instance_schema!(@get $get $kind $([$idx])? $member); )*
            $( instance_schema!(@set $set $kind $([$idx])? $member); )*
        }
    };
}

mod audio;
mod dialog;
mod engine;
mod fx;
mod item;
mod menu;
mod npc;

pub use audio::{MusicJingle, MusicSystem, MusicTheme, MusicTransitionEffect, SoundEffect, SoundSystem};
pub use dialog::{Info, Mission};
pub use engine::{Camera, FightAi, FightAiMove, Focus, GuildValues, Spell};
pub use fx::{EffectBase, ParticleEffect, ParticleEffectEmitKey};
pub use item::{Item, ItemFlags, ItemReact};
pub use menu::{Menu, MenuItem, MenuItemType};
pub use npc::{DamageType, Npc, NpcAttribute, NpcFlags, NpcTalent};

/// Accepts instances of any tag. Only the generic by-name accessors apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyInstance;

impl InstanceSchema for AnyInstance {
    const TYPE: InstanceType = InstanceType::Unknown;
}

/// Output voice lines (`C_SVM`). Members vary per game, so access is by name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Svm;

impl InstanceSchema for Svm {
    const TYPE: InstanceType = InstanceType::Svm;
}

fn cell_error(member: &str, index: usize, requested: ValueKind, e: CellError) -> VmError {
    match e {
        CellError::WrongKind(actual) => VmError::SymbolTypeMismatch { name: member.to_string(), requested, actual },
        CellError::OutOfRange(count) => VmError::IndexOutOfRange { name: member.to_string(), index, count },
    }
}

/// Reads one element of `member`. Only an undeclared member falls back to the default.
fn read<'vm, T: Default>(
    vm: &'vm DaedalusVm,
    handle: InstanceHandle,
    member: &str,
    index: usize,
    requested: ValueKind,
    f: impl FnOnce(&'vm Storage) -> std::result::Result<T, CellError>,
) -> Result<T> {
    match vm.member_storage(handle, member) {
        Ok(storage) => f(storage).map_err(|e| cell_error(member, index, requested, e)),
        Err(VmError::UnknownMember { .. }) => Ok(T::default()),
        Err(e) => Err(e),
    }
}

fn write(
    vm: &mut DaedalusVm,
    handle: InstanceHandle,
    member: &str,
    index: usize,
    requested: ValueKind,
    f: impl FnOnce(&mut Storage) -> std::result::Result<(), CellError>,
) -> Result<()> {
    f(vm.member_storage_mut(handle, member)?).map_err(|e| cell_error(member, index, requested, e))
}

/// Read-only typed view of one instance.
pub struct InstanceView<'vm, S> {
    vm: &'vm DaedalusVm,
    handle: InstanceHandle,
    _schema: PhantomData<S>,
}

impl<'vm, S: InstanceSchema> InstanceView<'vm, S> {
    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    pub fn int(&self, member: &str, index: usize) -> Result<i32> {
        read(self.vm, self.handle, member, index, ValueKind::Int, |s| s.int(index))
    }

    pub fn float(&self, member: &str, index: usize) -> Result<f32> {
        read(self.vm, self.handle, member, index, ValueKind::Float, |s| s.float(index))
    }

    pub fn string(&self, member: &str, index: usize) -> Result<&'vm str> {
        read(self.vm, self.handle, member, index, ValueKind::String, |s| s.string(index))
    }

    pub fn instance(&self, member: &str, index: usize) -> Result<Option<InstanceHandle>> {
        read(self.vm, self.handle, member, index, ValueKind::Instance, |s| s.instance(index))
    }
}

/// Mutable typed view of one instance.
pub struct InstanceViewMut<'vm, S> {
    vm: &'vm mut DaedalusVm,
    handle: InstanceHandle,
    _schema: PhantomData<S>,
}

impl<'vm, S: InstanceSchema> InstanceViewMut<'vm, S> {
    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    pub fn int(&self, member: &str, index: usize) -> Result<i32> {
        read(self.vm, self.handle, member, index, ValueKind::Int, |s| s.int(index))
    }

    pub fn float(&self, member: &str, index: usize) -> Result<f32> {
        read(self.vm, self.handle, member, index, ValueKind::Float, |s| s.float(index))
    }

    pub fn string(&self, member: &str, index: usize) -> Result<&str> {
        read(self.vm, self.handle, member, index, ValueKind::String, |s| s.string(index))
    }

    pub fn instance(&self, member: &str, index: usize) -> Result<Option<InstanceHandle>> {
        read(self.vm, self.handle, member, index, ValueKind::Instance, |s| s.instance(index))
    }

    pub fn set_int(&mut self, member: &str, index: usize, value: i32) -> Result<()> {
        write(self.vm, self.handle, member, index, ValueKind::Int, |s| s.set_int(index, value))
    }

    pub fn set_float(&mut self, member: &str, index: usize, value: f32) -> Result<()> {
        write(self.vm, self.handle, member, index, ValueKind::Float, |s| s.set_float(index, value))
    }

    pub fn set_string(&mut self, member: &str, index: usize, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        write(self.vm, self.handle, member, index, ValueKind::String, |s| s.set_string(index, value))
    }

    pub fn set_instance(&mut self, member: &str, index: usize, value: Option<InstanceHandle>) -> Result<()> {
        write(self.vm, self.handle, member, index, ValueKind::Instance, |s| s.set_instance(index, value))
    }
}

impl DaedalusVm {
    fn check_schema<S: InstanceSchema>(&self, handle: InstanceHandle) -> Result<()> {
        self.instances.get(handle)?;
        if S::TYPE != InstanceType::Unknown && handle.instance_type() != S::TYPE {
            return Err(VmError::InstanceTypeMismatch {
                expected: S::TYPE,
                found: handle.instance_type().to_string(),
            });
        }
        Ok(())
    }

    /// Typed read access to an instance allocated with tag `S::TYPE`.
    ///
    /// ```ignore
    /// let level = vm.view::<Npc>(hero)?.level()?;
    /// ```
    pub fn view<S: InstanceSchema>(&self, handle: InstanceHandle) -> Result<InstanceView<'_, S>> {
        self.check_schema::<S>(handle)?;
        Ok(InstanceView { vm: self, handle, _schema: PhantomData })
    }

    pub fn view_mut<S: InstanceSchema>(&mut self, handle: InstanceHandle) -> Result<InstanceViewMut<'_, S>> {
        self.check_schema::<S>(handle)?;
        Ok(InstanceViewMut { vm: self, handle, _schema: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};

    fn vm() -> DaedalusVm {
        let mut b = ScriptBuilder::new();
        let svm = b.class("C_SVM", &[("SMALLTALK01", DataType::String, 1)]);
        b.instance("SVM_0", svm).finish();
        let item = b.class("C_ITEM", &[("VALUE", DataType::Int, 1)]);
        b.instance("ITMI_GOLD", item).finish();
        DaedalusVm::new(b.load().unwrap())
    }

    #[test]
    fn generic_accessors_by_member_name() {
        let mut vm = vm();
        let svm = vm.alloc_instance("SVM_0", InstanceType::Svm).unwrap();
        {
            let mut view = vm.view_mut::<Svm>(svm).unwrap();
            view.set_string("SMALLTALK01", 0, "$SMALLTALK01").unwrap();
            assert!(matches!(view.set_string("SMALLTALK99", 0, "x"), Err(VmError::UnknownMember { .. })));
            assert!(matches!(view.set_int("SMALLTALK01", 0, 1), Err(VmError::SymbolTypeMismatch { .. })));
            assert!(matches!(view.set_string("SMALLTALK01", 1, "x"), Err(VmError::IndexOutOfRange { .. })));
        }
        let view = vm.view::<Svm>(svm).unwrap();
        assert_eq!(view.string("smalltalk01", 0).unwrap(), "$SMALLTALK01");
        assert_eq!(view.string("SMALLTALK99", 0).unwrap(), "");
        assert!(matches!(view.int("SMALLTALK01", 0), Err(VmError::SymbolTypeMismatch { .. })));
        assert!(matches!(
            view.string("SMALLTALK01", 1),
            Err(VmError::IndexOutOfRange { index: 1, count: 1, .. })
        ));
    }

    #[test]
    fn views_check_the_allocation_tag() {
        let mut vm = vm();
        let gold = vm.alloc_instance("ITMI_GOLD", InstanceType::Item).unwrap();
        assert!(matches!(vm.view::<Npc>(gold), Err(VmError::InstanceTypeMismatch { .. })));
        assert!(matches!(vm.view_mut::<Svm>(gold), Err(VmError::InstanceTypeMismatch { .. })));
        assert_eq!(vm.view::<AnyInstance>(gold).unwrap().int("VALUE", 0).unwrap(), 0);
        assert!(vm.view::<Item>(gold).is_ok());

        vm.free_instance(gold).unwrap();
        assert!(matches!(vm.view::<Item>(gold), Err(VmError::StaleInstance)));
    }
}
