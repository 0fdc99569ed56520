instance_schema! {
    /// Dialogue options (`C_INFO`).
    pub struct Info => Info {
        npc / set_npc: int = "NPC",
        nr / set_nr: int = "NR",
        important / set_important: int = "IMPORTANT",
        condition / set_condition: int = "CONDITION",
        information / set_information: int = "INFORMATION",
        description / set_description: string = "DESCRIPTION",
        trade / set_trade: int = "TRADE",
        permanent / set_permanent: int = "PERMANENT",
    }
}

instance_schema! {
    /// Quests (`C_MISSION`). The condition members hold function symbol indices.
    pub struct Mission => Mission {
        name / set_name: string = "NAME",
        description / set_description: string = "DESCRIPTION",
        duration / set_duration: int = "DURATION",
        important / set_important: int = "IMPORTANT",
        offer_conditions / set_offer_conditions: int = "OFFERCONDITIONS",
        offer / set_offer: int = "OFFER",
        success_conditions / set_success_conditions: int = "SUCCESSCONDITIONS",
        success / set_success: int = "SUCCESS",
        failure_conditions / set_failure_conditions: int = "FAILURECONDITIONS",
        failure / set_failure: int = "FAILURE",
        obsolete_conditions / set_obsolete_conditions: int = "OBSOLETECONDITIONS",
        obsolete / set_obsolete: int = "OBSOLETE",
        running / set_running: int = "RUNNING",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};
    use crate::vm::{DaedalusVm, InstanceType, Value, ValueKind};

    #[test]
    fn info_condition_is_callable_by_index() {
        let mut b = ScriptBuilder::new();
        let class = b.class(
            "C_INFO",
            &[("NPC", DataType::Int, 1), ("CONDITION", DataType::Function, 1), ("DESCRIPTION", DataType::String, 1)],
        );
        let condition = b.function("DIA_XARDAS_HELLO_CONDITION", &[], Some(DataType::Int)).pushi(1).finish();
        let mut info = b.instance("DIA_XARDAS_HELLO", class);
        info.set_int(class + 2, condition as i32).set_string(class + 3, "Hallo");
        info.finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let h = vm.init_instance("DIA_XARDAS_HELLO", InstanceType::Info).unwrap();
        let view = vm.view::<Info>(h).unwrap();
        assert_eq!(view.description().unwrap(), "Hallo");
        let function = view.condition().unwrap() as u32;

        let ok = vm.call(function, &[], Some(ValueKind::Int)).unwrap();
        assert_eq!(ok, Value::Int(1));
        assert!(matches!(vm.view::<Mission>(h), Err(crate::VmError::InstanceTypeMismatch { .. })));
    }
}
