use strum::{Display, EnumIter, FromRepr};

instance_schema! {
    /// Focus ranges for the player's target selection (`C_FOCUS`).
    pub struct Focus => Focus {
        npc_longrange / set_npc_longrange: float = "NPC_LONGRANGE",
        npc_range1 / set_npc_range1: float = "NPC_RANGE1",
        npc_range2 / set_npc_range2: float = "NPC_RANGE2",
        npc_azi / set_npc_azi: float = "NPC_AZI",
        npc_elevdo / set_npc_elevdo: float = "NPC_ELEVDO",
        npc_elevup / set_npc_elevup: float = "NPC_ELEVUP",
        npc_prio / set_npc_prio: int = "NPC_PRIO",
        item_range1 / set_item_range1: float = "ITEM_RANGE1",
        item_range2 / set_item_range2: float = "ITEM_RANGE2",
        item_azi / set_item_azi: float = "ITEM_AZI",
        item_elevdo / set_item_elevdo: float = "ITEM_ELEVDO",
        item_elevup / set_item_elevup: float = "ITEM_ELEVUP",
        item_prio / set_item_prio: int = "ITEM_PRIO",
        mob_range1 / set_mob_range1: float = "MOB_RANGE1",
        mob_range2 / set_mob_range2: float = "MOB_RANGE2",
        mob_azi / set_mob_azi: float = "MOB_AZI",
        mob_elevdo / set_mob_elevdo: float = "MOB_ELEVDO",
        mob_elevup / set_mob_elevup: float = "MOB_ELEVUP",
        mob_prio / set_mob_prio: int = "MOB_PRIO",
    }
}

instance_schema! {
    /// Camera modes (`CCAMSYS`).
    pub struct Camera => Camera {
        best_range / set_best_range: float = "BESTRANGE",
        min_range / set_min_range: float = "MINRANGE",
        max_range / set_max_range: float = "MAXRANGE",
        best_elevation / set_best_elevation: float = "BESTELEVATION",
        min_elevation / set_min_elevation: float = "MINELEVATION",
        max_elevation / set_max_elevation: float = "MAXELEVATION",
        best_azimuth / set_best_azimuth: float = "BESTAZIMUTH",
        min_azimuth / set_min_azimuth: float = "MINAZIMUTH",
        max_azimuth / set_max_azimuth: float = "MAXAZIMUTH",
        best_rot_z / set_best_rot_z: float = "BESTROTZ",
        min_rot_z / set_min_rot_z: float = "MINROTZ",
        max_rot_z / set_max_rot_z: float = "MAXROTZ",
        rot_offset_x / set_rot_offset_x: float = "ROTOFFSETX",
        rot_offset_y / set_rot_offset_y: float = "ROTOFFSETY",
        rot_offset_z / set_rot_offset_z: float = "ROTOFFSETZ",
        target_offset_x / set_target_offset_x: float = "TARGETOFFSETX",
        target_offset_y / set_target_offset_y: float = "TARGETOFFSETY",
        target_offset_z / set_target_offset_z: float = "TARGETOFFSETZ",
        velo_trans / set_velo_trans: float = "VELOTRANS",
        velo_rot / set_velo_rot: float = "VELOROT",
        translate / set_translate: int = "TRANSLATE",
        rotate / set_rotate: int = "ROTATE",
        collision / set_collision: int = "COLLISION",
    }
}

/// Entries of `C_FIGHTAI.MOVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(i32)]
#[strum(serialize_all = "snake_case")]
pub enum FightAiMove {
    Nop = 0,
    Run = 1,
    RunBack = 2,
    JumpBack = 3,
    Turn = 4,
    Strafe = 5,
    Attack = 6,
    AttackSide = 7,
    AttackFront = 8,
    AttackTriple = 9,
    AttackWhirl = 10,
    AttackMaster = 11,
    TurnToHit = 15,
    Parry = 17,
    StandUp = 18,
    Wait = 19,
    WaitLonger = 23,
    WaitExt = 24,
}

instance_schema! {
    /// Combat move tables (`C_FIGHTAI`).
    pub struct FightAi => FightAi {
        raw_move / set_raw_move: int[usize] = "MOVE",
    }
}

impl super::InstanceView<'_, FightAi> {
    /// `None` for unknown move codes.
    pub fn fight_move(&self, i: usize) -> crate::error::Result<Option<FightAiMove>> {
        Ok(FightAiMove::from_repr(self.raw_move(i)?))
    }
}

instance_schema! {
    /// Per-guild movement and combat constants (`C_GILVALUES`), one entry per guild.
    pub struct GuildValues => GuildValues {
        water_depth_knee / set_water_depth_knee: int[usize] = "WATER_DEPTH_KNEE",
        water_depth_chest / set_water_depth_chest: int[usize] = "WATER_DEPTH_CHEST",
        jump_up_height / set_jump_up_height: int[usize] = "JUMPUP_HEIGHT",
        swim_time / set_swim_time: int[usize] = "SWIM_TIME",
        dive_time / set_dive_time: int[usize] = "DIVE_TIME",
        step_height / set_step_height: int[usize] = "STEP_HEIGHT",
        jump_low_height / set_jump_low_height: int[usize] = "JUMPLOW_HEIGHT",
        jump_mid_height / set_jump_mid_height: int[usize] = "JUMPMID_HEIGHT",
        slide_angle / set_slide_angle: int[usize] = "SLIDE_ANGLE",
        slide_angle2 / set_slide_angle2: int[usize] = "SLIDE_ANGLE2",
        disable_autoroll / set_disable_autoroll: int[usize] = "DISABLE_AUTOROLL",
        surface_align / set_surface_align: int[usize] = "SURFACE_ALIGN",
        climb_heading_angle / set_climb_heading_angle: int[usize] = "CLIMB_HEADING_ANGLE",
        climb_horiz_angle / set_climb_horiz_angle: int[usize] = "CLIMB_HORIZ_ANGLE",
        climb_ground_angle / set_climb_ground_angle: int[usize] = "CLIMB_GROUND_ANGLE",
        fight_range_base / set_fight_range_base: int[usize] = "FIGHT_RANGE_BASE",
        fight_range_fist / set_fight_range_fist: int[usize] = "FIGHT_RANGE_FIST",
        fight_range_g / set_fight_range_g: int[usize] = "FIGHT_RANGE_G",
        fight_range_1hs / set_fight_range_1hs: int[usize] = "FIGHT_RANGE_1HS",
        fight_range_1ha / set_fight_range_1ha: int[usize] = "FIGHT_RANGE_1HA",
        fight_range_2hs / set_fight_range_2hs: int[usize] = "FIGHT_RANGE_2HS",
        fight_range_2ha / set_fight_range_2ha: int[usize] = "FIGHT_RANGE_2HA",
        falldown_height / set_falldown_height: int[usize] = "FALLDOWN_HEIGHT",
        falldown_damage / set_falldown_damage: int[usize] = "FALLDOWN_DAMAGE",
        blood_disabled / set_blood_disabled: int[usize] = "BLOOD_DISABLED",
        blood_max_distance / set_blood_max_distance: int[usize] = "BLOOD_MAX_DISTANCE",
        blood_amount / set_blood_amount: int[usize] = "BLOOD_AMOUNT",
        blood_flow / set_blood_flow: int[usize] = "BLOOD_FLOW",
        blood_emitter / set_blood_emitter: string[usize] = "BLOOD_EMITTER",
        blood_texture / set_blood_texture: string[usize] = "BLOOD_TEXTURE",
        turn_speed / set_turn_speed: int[usize] = "TURN_SPEED",
    }
}

instance_schema! {
    /// Spell parameters (`C_SPELL`).
    pub struct Spell => Spell {
        time_per_mana / set_time_per_mana: float = "TIME_PER_MANA",
        damage_per_level / set_damage_per_level: int = "DAMAGE_PER_LEVEL",
        damage_type / set_damage_type: int = "DAMAGETYPE",
        spell_type / set_spell_type: int = "SPELLTYPE",
        can_turn_during_invest / set_can_turn_during_invest: int = "CANTURNDURINGINVEST",
        can_change_target_during_invest / set_can_change_target_during_invest: int = "CANCHANGETARGETDURINGINVEST",
        is_multi_effect / set_is_multi_effect: int = "ISMULTIEFFECT",
        target_collect_algo / set_target_collect_algo: int = "TARGETCOLLECTALGO",
        target_collect_type / set_target_collect_type: int = "TARGETCOLLECTTYPE",
        target_collect_range / set_target_collect_range: int = "TARGETCOLLECTRANGE",
        target_collect_azi / set_target_collect_azi: int = "TARGETCOLLECTAZI",
        target_collect_elev / set_target_collect_elev: int = "TARGETCOLLECTELEV",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};
    use crate::vm::{DaedalusVm, InstanceType};
    use crate::VmError;

    #[test]
    fn guild_arrays_and_move_codes() {
        let mut b = ScriptBuilder::new();
        let gil = b.class("C_GILVALUES", &[("SWIM_TIME", DataType::Int, 66)]);
        b.instance("GIL_VALUES", gil).set_int_at(gil + 1, 3, 120).finish();
        let ai = b.class("C_FIGHTAI", &[("MOVE", DataType::Int, 6)]);
        b.instance("FA_ENEMY_PREHIT_6", ai).set_int_at(ai + 1, 0, 17).set_int_at(ai + 1, 1, 99).finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let gil = vm.init_instance("GIL_VALUES", InstanceType::GuildValues).unwrap();
        let ai = vm.init_instance("FA_ENEMY_PREHIT_6", InstanceType::FightAi).unwrap();

        let values = vm.view::<GuildValues>(gil).unwrap();
        assert_eq!(values.swim_time(3).unwrap(), 120);
        assert!(matches!(
            values.swim_time(66),
            Err(VmError::IndexOutOfRange { index: 66, count: 66, .. })
        ));
        assert_eq!(values.dive_time(3).unwrap(), 0);

        let moves = vm.view::<FightAi>(ai).unwrap();
        assert_eq!(moves.fight_move(0).unwrap(), Some(FightAiMove::Parry));
        assert_eq!(moves.fight_move(1).unwrap(), None);
        assert_eq!(moves.fight_move(2).unwrap(), Some(FightAiMove::Nop));
        assert!(moves.fight_move(6).is_err());
    }
}
