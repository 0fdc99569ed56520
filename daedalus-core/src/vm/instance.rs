use std::rc::Rc;

use strum::{Display, EnumIter};

use crate::error::{Result, VmError};
use crate::format::{DataType, Symbol, SymbolKey, GLOBAL_SLOT_NAMES};
use crate::trace;
use crate::vm::storage::Storage;
use crate::vm::DaedalusVm;

/// Closed set of instance layouts the engine knows about. The tag picks the accessor schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceType {
    GuildValues,
    Npc,
    Mission,
    Item,
    Focus,
    Info,
    ItemReact,
    Spell,
    Svm,
    Menu,
    MenuItem,
    Camera,
    MusicSystem,
    MusicTheme,
    MusicJingle,
    ParticleEffect,
    EffectBase,
    ParticleEffectEmitKey,
    FightAi,
    SoundEffect,
    SoundSystem,
    /// Any class; only the generic by-name accessors apply.
    Unknown,
}

impl InstanceType {
    /// Script class an instance of this type must derive from.
    pub fn class_name(self) -> Option<&'static str> {
        Some(match self {
            InstanceType::GuildValues => "C_GILVALUES",
            InstanceType::Npc => "C_NPC",
            InstanceType::Mission => "C_MISSION",
            InstanceType::Item => "C_ITEM",
            InstanceType::Focus => "C_FOCUS",
            InstanceType::Info => "C_INFO",
            InstanceType::ItemReact => "C_ITEMREACT",
            InstanceType::Spell => "C_SPELL",
            InstanceType::Svm => "C_SVM",
            InstanceType::Menu => "C_MENU",
            InstanceType::MenuItem => "C_MENU_ITEM",
            InstanceType::Camera => "CCAMSYS",
            InstanceType::MusicSystem => "C_MUSICSYS_CFG",
            InstanceType::MusicTheme => "C_MUSICTHEME",
            InstanceType::MusicJingle => "C_MUSICJINGLE",
            InstanceType::ParticleEffect => "C_PARTICLEFX",
            InstanceType::EffectBase => "CFX_BASE",
            InstanceType::ParticleEffectEmitKey => "C_PARTICLEFXEMITKEY",
            InstanceType::FightAi => "C_FIGHTAI",
            InstanceType::SoundEffect => "C_SFX",
            InstanceType::SoundSystem => "C_SNDSYS_CFG",
            InstanceType::Unknown => return None,
        })
    }

    pub fn accepts_class(self, class: &str) -> bool {
        match self.class_name() {
            Some(expected) => expected.eq_ignore_ascii_case(class),
            None => true,
        }
    }
}

/// Non-owning reference to a VM-owned instance.
///
/// Copies are cheap. A handle outlives nothing: once the instance is freed every copy reports
/// `StaleInstance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    slot: u32,
    generation: u32,
    symbol: u32,
    ty: InstanceType,
}

impl InstanceHandle {
    /// Index of the instance symbol that defines this instance.
    pub fn index(&self) -> u32 {
        self.symbol
    }

    pub fn instance_type(&self) -> InstanceType {
        self.ty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Fields hold defaults; the body has not run.
    Allocated,
    Initialized,
}

#[derive(Debug)]
pub(crate) struct InstanceData {
    pub class: u32,
    pub state: InstanceState,
    /// One entry per class member, in declaration order.
    pub fields: Vec<Storage>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<InstanceData>,
}

/// Slab of live instances with generation-checked handles.
#[derive(Debug)]
pub(crate) struct InstanceRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl InstanceRegistry {
    pub fn new(limit: usize) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0, limit }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn insert(&mut self, symbol: u32, ty: InstanceType, data: InstanceData) -> Result<InstanceHandle> {
        if self.live >= self.limit {
            return Err(VmError::AllocationExhausted { limit: self.limit });
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot { generation: 0, data: None });
                (self.slots.len() - 1) as u32
            }
        };

        let entry = &mut self.slots[slot as usize];
        entry.data = Some(data);
        self.live += 1;
        Ok(InstanceHandle { slot, generation: entry.generation, symbol, ty })
    }

    pub fn get(&self, h: InstanceHandle) -> Result<&InstanceData> {
        self.slots
            .get(h.slot as usize)
            .filter(|s| s.generation == h.generation)
            .and_then(|s| s.data.as_ref())
            .ok_or(VmError::StaleInstance)
    }

    pub fn get_mut(&mut self, h: InstanceHandle) -> Result<&mut InstanceData> {
        self.slots
            .get_mut(h.slot as usize)
            .filter(|s| s.generation == h.generation)
            .and_then(|s| s.data.as_mut())
            .ok_or(VmError::StaleInstance)
    }

    pub fn remove(&mut self, h: InstanceHandle) -> Result<InstanceData> {
        self.get(h)?;
        let entry = &mut self.slots[h.slot as usize];
        let data = entry.data.take().ok_or(VmError::StaleInstance)?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(h.slot);
        self.live -= 1;
        Ok(data)
    }
}

/// `instance X(C_NPC) { .. }` is const and owns a body; `var C_NPC x` is neither.
fn is_instance_definition(sym: &Symbol) -> bool {
    sym.data_type() == DataType::Instance && sym.is_const() && !sym.is_member()
}

impl DaedalusVm {
    /// Reserves an instance for the instance symbol `key` without running its body.
    ///
    /// The symbol is rebound to the new instance. Fields start at zero or empty.
    pub fn alloc_instance<'k>(&mut self, key: impl Into<SymbolKey<'k>>, ty: InstanceType) -> Result<InstanceHandle> {
        let script = Rc::clone(&self.script);
        let sym = script.find(key)?;
        if !is_instance_definition(sym) {
            return Err(VmError::NotAnInstance { name: sym.name().to_string() });
        }

        let class = script
            .class_of(sym)
            .ok_or_else(|| VmError::NotAnInstance { name: sym.name().to_string() })?;
        if !ty.accepts_class(class.name()) {
            return Err(VmError::InstanceTypeMismatch { expected: ty, found: class.name().to_string() });
        }

        let fields = script.members_of(class).iter().map(Storage::for_symbol).collect();
        let data = InstanceData { class: class.index(), state: InstanceState::Allocated, fields };
        let handle = self.instances.insert(sym.index(), ty, data)?;

        self.bind_instance(sym.index(), Some(handle));
        trace::instance(format_args!("alloc {} as {} (slot {})", sym.name(), ty, handle.slot));
        Ok(handle)
    }

    /// Allocates an instance and runs its body.
    pub fn init_instance<'k>(&mut self, key: impl Into<SymbolKey<'k>>, ty: InstanceType) -> Result<InstanceHandle> {
        self.ensure_usable()?;
        let handle = self.alloc_instance(key, ty)?;
        self.init_instance_direct(handle)?;
        Ok(handle)
    }

    /// Runs the body of an already allocated instance.
    ///
    /// The body executes with the instance as both the current instance and `SELF`; both are
    /// restored afterwards. Running it again re-executes the body.
    pub fn init_instance_direct(&mut self, handle: InstanceHandle) -> Result<()> {
        self.ensure_usable()?;
        self.instances.get(handle)?;

        let script = Rc::clone(&self.script);
        let sym = script.find(handle.index())?;
        if !is_instance_definition(sym) {
            return Err(VmError::NotAnInstance { name: sym.name().to_string() });
        }
        let self_slot = self.slot_symbol(GlobalSlot::Self_);

        let saved_context = self.context;
        let saved_self = self.bound_instance(self_slot);
        self.context = Some(handle);
        self.bind_instance(self_slot, Some(handle));

        trace::instance(format_args!("init {}", sym.name()));
        let result = self.run_function(sym.index(), sym.address());

        self.context = saved_context;
        self.bind_instance(self_slot, saved_self);
        result?;

        self.instances.get_mut(handle)?.state = InstanceState::Initialized;
        Ok(())
    }

    /// Releases an instance. Symbol bindings to it are cleared; other copies of the handle go stale.
    pub fn free_instance(&mut self, handle: InstanceHandle) -> Result<()> {
        self.instances.remove(handle)?;
        for storage in self.globals.iter_mut() {
            storage.forget(handle);
        }
        if self.context == Some(handle) {
            self.context = None;
        }
        trace::instance(format_args!("free #{} (slot {})", handle.index(), handle.slot));
        Ok(())
    }

    pub fn instance_state(&self, handle: InstanceHandle) -> Result<InstanceState> {
        Ok(self.instances.get(handle)?.state)
    }

    /// Name of the script class backing the instance.
    pub fn instance_class_name(&self, handle: InstanceHandle) -> Result<&str> {
        let class = self.instances.get(handle)?.class;
        Ok(self.script.find(class)?.name())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Instance currently bound to an instance symbol.
    pub fn symbol_instance<'k>(&self, key: impl Into<SymbolKey<'k>>) -> Result<Option<InstanceHandle>> {
        let sym = self.script.find(key)?;
        Ok(self.bound_instance(sym.index()))
    }

    pub(crate) fn bound_instance(&self, symbol: u32) -> Option<InstanceHandle> {
        self.globals
            .get(symbol as usize)
            .and_then(|s| s.instance(0).ok())
            .flatten()
    }

    pub(crate) fn bind_instance(&mut self, symbol: u32, handle: Option<InstanceHandle>) {
        if let Some(storage) = self.globals.get_mut(symbol as usize) {
            if storage.set_instance(0, handle).is_err() {
                *storage = Storage::Instance(vec![handle]);
            }
        }
    }

    /// Storage of `member` (unqualified) inside the instance.
    pub(crate) fn member_storage(&self, handle: InstanceHandle, member: &str) -> Result<&Storage> {
        let data = self.instances.get(handle)?;
        let ordinal = self.member_ordinal(data.class, member)?;
        data.fields.get(ordinal).ok_or(VmError::StaleInstance)
    }

    pub(crate) fn member_storage_mut(&mut self, handle: InstanceHandle, member: &str) -> Result<&mut Storage> {
        let class = self.instances.get(handle)?.class;
        let ordinal = self.member_ordinal(class, member)?;
        self.instances.get_mut(handle)?.fields.get_mut(ordinal).ok_or(VmError::StaleInstance)
    }

    fn member_ordinal(&self, class: u32, member: &str) -> Result<usize> {
        let class = self.script.find(class)?;
        let sym = self.script.find_member(class, member).ok_or_else(|| VmError::UnknownMember {
            class: class.name().to_string(),
            member: member.to_string(),
        })?;
        Ok((sym.index() - class.index() - 1) as usize)
    }
}

/// The five VM-wide instance variables scripts read implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum GlobalSlot {
    #[strum(serialize = "self")]
    Self_,
    #[strum(serialize = "other")]
    Other,
    #[strum(serialize = "victim")]
    Victim,
    #[strum(serialize = "hero")]
    Hero,
    #[strum(serialize = "item")]
    Item,
}

impl GlobalSlot {
    pub fn symbol_name(self) -> &'static str {
        GLOBAL_SLOT_NAMES[self as usize]
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::format::ScriptBuilder;

    fn data() -> InstanceData {
        InstanceData { class: 0, state: InstanceState::Allocated, fields: Vec::new() }
    }

    #[test]
    fn registry_limits_and_generations() {
        let mut reg = InstanceRegistry::new(2);
        let a = reg.insert(10, InstanceType::Npc, data()).unwrap();
        let b = reg.insert(11, InstanceType::Item, data()).unwrap();
        assert!(matches!(
            reg.insert(12, InstanceType::Npc, data()),
            Err(VmError::AllocationExhausted { limit: 2 })
        ));

        reg.remove(a).unwrap();
        assert!(matches!(reg.get(a), Err(VmError::StaleInstance)));
        let c = reg.insert(12, InstanceType::Npc, data()).unwrap();
        assert_ne!(a, c);
        assert!(reg.get(c).is_ok());
        assert!(reg.get(b).is_ok());
        assert_eq!(reg.len(), 2);
        assert_eq!(c.index(), 12);
    }

    #[test]
    fn instance_variables_have_no_body_to_run() {
        let mut b = ScriptBuilder::new();
        let side_effect = b.external("SIDE_EFFECT", &[], None);
        b.function("STARTUP", &[], None).be(side_effect).finish();
        let class = b.class("C_NPC", &[("ID", DataType::Int, 1)]);
        b.instance_var("SOME_NPC_VAR", class);
        b.instance("PC_HERO", class).finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        vm.register_external("SIDE_EFFECT", move |_vm, ()| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .unwrap();

        assert!(matches!(
            vm.init_instance("SOME_NPC_VAR", InstanceType::Npc),
            Err(VmError::NotAnInstance { name }) if name == "SOME_NPC_VAR"
        ));
        assert!(matches!(
            vm.alloc_instance("SOME_NPC_VAR", InstanceType::Npc),
            Err(VmError::NotAnInstance { .. })
        ));
        assert_eq!(runs.get(), 0);
        assert_eq!(vm.instance_count(), 0);
        assert!(!vm.is_poisoned());

        let hero = vm.init_instance("PC_HERO", InstanceType::Npc).unwrap();
        assert_eq!(vm.instance_state(hero).unwrap(), InstanceState::Initialized);
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn type_tags_match_class_names() {
        assert!(InstanceType::Npc.accepts_class("c_npc"));
        assert!(!InstanceType::Npc.accepts_class("C_ITEM"));
        assert!(InstanceType::Unknown.accepts_class("ANYTHING"));
        assert_eq!(InstanceType::ParticleEffectEmitKey.to_string(), "PARTICLE_EFFECT_EMIT_KEY");
        assert_eq!(GlobalSlot::Victim.symbol_name(), "VICTIM");
    }
}
