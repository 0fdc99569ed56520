use bitflags::bitflags;

use super::npc::DamageType;

bitflags! {
    /// Category and property bits of `C_ITEM.MAINFLAG` and `C_ITEM.FLAGS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemFlags: i32 {
        const RING = 1 << 11;
        const MISSION = 1 << 12;
        const DAG = 1 << 13;
        const SWD = 1 << 14;
        const AXE = 1 << 15;
        const TWO_HD_SWD = 1 << 16;
        const TWO_HD_AXE = 1 << 17;
        const SHIELD = 1 << 18;
        const BOW = 1 << 19;
        const CROSSBOW = 1 << 20;
        const MULTI = 1 << 21;
        const AMULET = 1 << 22;
        const BELT = 1 << 24;
    }
}

instance_schema! {
    /// Items (`C_ITEM`).
    pub struct Item => Item {
        id / set_id: int = "ID",
        name / set_name: string = "NAME",
        name_id / set_name_id: string = "NAMEID",
        hp / set_hp: int = "HP",
        hp_max / set_hp_max: int = "HP_MAX",
        main_flag / set_main_flag: int = "MAINFLAG",
        raw_flags / set_raw_flags: int = "FLAGS",
        weight / set_weight: int = "WEIGHT",
        value / set_value: int = "VALUE",
        damage_type / set_damage_type: int = "DAMAGETYPE",
        damage_total / set_damage_total: int = "DAMAGETOTAL",
        damage / set_damage: int[DamageType] = "DAMAGE",
        wear / set_wear: int = "WEAR",
        protection / set_protection: int[DamageType] = "PROTECTION",
        nutrition / set_nutrition: int = "NUTRITION",
        cond_atr / set_cond_atr: int[usize] = "COND_ATR",
        cond_value / set_cond_value: int[usize] = "COND_VALUE",
        change_atr / set_change_atr: int[usize] = "CHANGE_ATR",
        change_value / set_change_value: int[usize] = "CHANGE_VALUE",
        magic / set_magic: int = "MAGIC",
        on_equip / set_on_equip: int = "ON_EQUIP",
        on_unequip / set_on_unequip: int = "ON_UNEQUIP",
        on_state / set_on_state: int[usize] = "ON_STATE",
        owner / set_owner: int = "OWNER",
        owner_guild / set_owner_guild: int = "OWNERGUILD",
        disguise_guild / set_disguise_guild: int = "DISGUISEGUILD",
        visual / set_visual: string = "VISUAL",
        visual_change / set_visual_change: string = "VISUAL_CHANGE",
        effect / set_effect: string = "EFFECT",
        visual_skin / set_visual_skin: int = "VISUAL_SKIN",
        scheme_name / set_scheme_name: string = "SCEMENAME",
        material / set_material: int = "MATERIAL",
        munition / set_munition: int = "MUNITION",
        spell / set_spell: int = "SPELL",
        range / set_range: int = "RANGE",
        mag_circle / set_mag_circle: int = "MAG_CIRCLE",
        description / set_description: string = "DESCRIPTION",
        text / set_text: string[usize] = "TEXT",
        count / set_count: int[usize] = "COUNT",
        inv_z_bias / set_inv_z_bias: int = "INV_ZBIAS",
        inv_rot_x / set_inv_rot_x: int = "INV_ROTX",
        inv_rot_y / set_inv_rot_y: int = "INV_ROTY",
        inv_rot_z / set_inv_rot_z: int = "INV_ROTZ",
        inv_animate / set_inv_animate: int = "INV_ANIMATE",
    }
}

impl super::InstanceView<'_, Item> {
    pub fn flags(&self) -> crate::error::Result<ItemFlags> {
        Ok(ItemFlags::from_bits_retain(self.raw_flags()?))
    }
}

instance_schema! {
    /// Trade reactions (`C_ITEMREACT`).
    pub struct ItemReact => ItemReact {
        npc / set_npc: int = "NPC",
        trade_item / set_trade_item: int = "TRADE_ITEM",
        trade_amount / set_trade_amount: int = "TRADE_AMOUNT",
        requested_category / set_requested_category: int = "REQUESTED_CAT",
        requested_item / set_requested_item: int = "REQUESTED_ITEM",
        requested_amount / set_requested_amount: int = "REQUESTED_AMOUNT",
        reaction / set_reaction: int = "REACTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};
    use crate::vm::{DaedalusVm, InstanceType};

    #[test]
    fn prototype_defaults_apply_before_the_instance_body() {
        let mut b = ScriptBuilder::new();
        let class = b.class(
            "C_ITEM",
            &[("VALUE", DataType::Int, 1), ("DAMAGE", DataType::Int, 8), ("TEXT", DataType::String, 6)],
        );
        let (value, damage, text) = (class + 1, class + 2, class + 3);
        let mut proto = b.prototype("ITEMPR_SWORD", class);
        proto.set_int(value, 10).set_int_at(damage, DamageType::Edge as u8, 30);
        let proto = proto.finish();
        let mut sword = b.instance("ITMW_SCHWERT", proto);
        sword.set_int(value, 120).set_string(text, "Schaden");
        sword.finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let h = vm.init_instance("ITMW_SCHWERT", InstanceType::Item).unwrap();
        let view = vm.view::<Item>(h).unwrap();
        assert_eq!(view.value().unwrap(), 120);
        assert_eq!(view.damage(DamageType::Edge).unwrap(), 30);
        assert_eq!(view.damage(DamageType::Fire).unwrap(), 0);
        assert_eq!(view.text(0).unwrap(), "Schaden");
        assert_eq!(view.name().unwrap(), "");
        assert_eq!(view.flags().unwrap(), ItemFlags::empty());
    }
}
