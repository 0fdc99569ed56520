use bitflags::bitflags;
use strum::{Display, EnumIter, FromRepr};

/// Index into `C_NPC.ATTRIBUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(usize)]
#[strum(serialize_all = "snake_case")]
pub enum NpcAttribute {
    Hitpoints = 0,
    HitpointsMax = 1,
    Mana = 2,
    ManaMax = 3,
    Strength = 4,
    Dexterity = 5,
    RegenerateHp = 6,
    RegenerateMana = 7,
}

/// Index into `DAMAGE` and `PROTECTION` arrays of NPCs and items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(usize)]
#[strum(serialize_all = "snake_case")]
pub enum DamageType {
    Barrier = 0,
    Blunt = 1,
    Edge = 2,
    Fire = 3,
    Fly = 4,
    Magic = 5,
    Point = 6,
    Fall = 7,
}

/// Index into `C_NPC.HITCHANCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(usize)]
#[strum(serialize_all = "snake_case")]
pub enum NpcTalent {
    Unknown = 0,
    OneHanded = 1,
    TwoHanded = 2,
    Bow = 3,
    Crossbow = 4,
}

bitflags! {
    /// `C_NPC.FLAGS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NpcFlags: i32 {
        const FRIENDS = 1 << 0;
        const IMMORTAL = 1 << 1;
        const GHOST = 1 << 2;
        const PROTECTED = 1 << 3;
    }
}

instance_schema! {
    /// Characters (`C_NPC`).
    pub struct Npc => Npc {
        id / set_id: int = "ID",
        name / set_name: string[usize] = "NAME",
        slot / set_slot: string = "SLOT",
        effect / set_effect: string = "EFFECT",
        npc_type / set_npc_type: int = "NPCTYPE",
        raw_flags / set_raw_flags: int = "FLAGS",
        attribute / set_attribute: int[NpcAttribute] = "ATTRIBUTE",
        hit_chance / set_hit_chance: int[NpcTalent] = "HITCHANCE",
        protection / set_protection: int[DamageType] = "PROTECTION",
        damage / set_damage: int[DamageType] = "DAMAGE",
        damage_type / set_damage_type: int = "DAMAGETYPE",
        guild / set_guild: int = "GUILD",
        level / set_level: int = "LEVEL",
        mission / set_mission: int[usize] = "MISSION",
        fight_tactic / set_fight_tactic: int = "FIGHT_TACTIC",
        weapon / set_weapon: int = "WEAPON",
        voice / set_voice: int = "VOICE",
        voice_pitch / set_voice_pitch: int = "VOICEPITCH",
        body_mass / set_body_mass: int = "BODYMASS",
        daily_routine / set_daily_routine: int = "DAILY_ROUTINE",
        start_ai_state / set_start_ai_state: int = "START_AISTATE",
        spawn_point / set_spawn_point: string = "SPAWNPOINT",
        spawn_delay / set_spawn_delay: int = "SPAWNDELAY",
        senses / set_senses: int = "SENSES",
        senses_range / set_senses_range: int = "SENSES_RANGE",
        ai_var / set_ai_var: int[usize] = "AIVAR",
        wp / set_wp: string = "WP",
        exp / set_exp: int = "EXP",
        exp_next / set_exp_next: int = "EXP_NEXT",
        lp / set_lp: int = "LP",
        body_state_interruptable_override / set_body_state_interruptable_override: int = "BODYSTATEINTERRUPTABLEOVERRIDE",
        no_focus / set_no_focus: int = "NOFOCUS",
    }
}

impl super::InstanceView<'_, Npc> {
    pub fn flags(&self) -> crate::error::Result<NpcFlags> {
        Ok(NpcFlags::from_bits_retain(self.raw_flags()?))
    }
}

impl super::InstanceViewMut<'_, Npc> {
    pub fn flags(&self) -> crate::error::Result<NpcFlags> {
        Ok(NpcFlags::from_bits_retain(self.raw_flags()?))
    }

    pub fn set_flags(&mut self, flags: NpcFlags) -> crate::error::Result<()> {
        self.set_raw_flags(flags.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, Opcode, ScriptBuilder};
    use crate::vm::{DaedalusVm, InstanceType};

    #[test]
    fn script_and_host_share_fields() {
        let mut b = ScriptBuilder::new();
        let npc = b.class(
            "C_NPC",
            &[
                ("NAME", DataType::String, 5),
                ("ATTRIBUTE", DataType::Int, 8),
                ("LEVEL", DataType::Int, 1),
                ("FLAGS", DataType::Int, 1),
            ],
        );
        let name = npc + 1;
        let attribute = npc + 2;
        let level = npc + 3;
        let mut hero = b.instance("PC_HERO", npc);
        hero.set_string(name, "Held").set_int(level, 3);
        hero.pushi(40).pushvv(attribute, NpcAttribute::HitpointsMax as u8).op(Opcode::Movi);
        hero.finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let h = vm.init_instance("PC_HERO", InstanceType::Npc).unwrap();

        let view = vm.view::<Npc>(h).unwrap();
        assert_eq!(view.name(0).unwrap(), "Held");
        assert_eq!(view.level().unwrap(), 3);
        assert_eq!(view.attribute(NpcAttribute::HitpointsMax).unwrap(), 40);
        assert_eq!(view.ai_var(12).unwrap(), 0);
        assert_eq!(view.flags().unwrap(), NpcFlags::empty());
        assert!(matches!(
            view.name(7),
            Err(crate::VmError::IndexOutOfRange { index: 7, count: 5, .. })
        ));

        let mut view = vm.view_mut::<Npc>(h).unwrap();
        view.set_attribute(NpcAttribute::Hitpoints, 25).unwrap();
        view.set_flags(NpcFlags::IMMORTAL | NpcFlags::GHOST).unwrap();
        assert!(view.set_ai_var(0, 1).is_err());

        assert_eq!(vm.get_int("C_NPC.ATTRIBUTE", 0, Some(h)).unwrap(), 25);
        assert_eq!(vm.get_int("C_NPC.FLAGS", 0, Some(h)).unwrap(), 6);
    }
}
