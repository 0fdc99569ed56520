use strum::{Display, FromRepr};

/// `C_MUSICTHEME.TRANSTYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(i32)]
#[strum(serialize_all = "snake_case")]
pub enum MusicTransitionEffect {
    Unknown = 0,
    NoEffect = 1,
    Groove = 2,
    Fill = 3,
    Break = 4,
    Intro = 5,
    End = 6,
    EndAndIntro = 7,
}

instance_schema! {
    /// Global music settings (`C_MUSICSYS_CFG`).
    pub struct MusicSystem => MusicSystem {
        volume / set_volume: float = "VOLUME",
        bit_resolution / set_bit_resolution: int = "BITRESOLUTION",
        global_reverb_enabled / set_global_reverb_enabled: int = "GLOBALREVERBENABLED",
        sample_rate / set_sample_rate: int = "SAMPLERATE",
        num_channels / set_num_channels: int = "NUMCHANNELS",
        reverb_buffer_size / set_reverb_buffer_size: int = "REVERBBUFFERSIZE",
    }
}

instance_schema! {
    /// Music segments (`C_MUSICTHEME`).
    pub struct MusicTheme => MusicTheme {
        file / set_file: string = "FILE",
        vol / set_vol: float = "VOL",
        looping / set_looping: int = "LOOP",
        reverb_mix / set_reverb_mix: float = "REVERBMIX",
        reverb_time / set_reverb_time: float = "REVERBTIME",
        raw_trans_type / set_raw_trans_type: int = "TRANSTYPE",
        trans_sub_type / set_trans_sub_type: int = "TRANSSUBTYPE",
    }
}

impl super::InstanceView<'_, MusicTheme> {
    pub fn trans_type(&self) -> crate::error::Result<Option<MusicTransitionEffect>> {
        Ok(MusicTransitionEffect::from_repr(self.raw_trans_type()?))
    }
}

instance_schema! {
    /// Short music cues (`C_MUSICJINGLE`).
    pub struct MusicJingle => MusicJingle {
        name / set_name: string = "NAME",
        looping / set_looping: int = "LOOP",
        vol / set_vol: float = "VOL",
        trans_sub_type / set_trans_sub_type: int = "TRANSSUBTYPE",
    }
}

instance_schema! {
    /// Sound effects (`C_SFX`).
    pub struct SoundEffect => SoundEffect {
        file / set_file: string = "FILE",
        pitch_off / set_pitch_off: int = "PITCHOFF",
        pitch_var / set_pitch_var: int = "PITCHVAR",
        volume / set_volume: int = "VOL",
        looping / set_looping: int = "LOOP",
        loop_start_offset / set_loop_start_offset: int = "LOOPSTARTOFFSET",
        loop_end_offset / set_loop_end_offset: int = "LOOPENDOFFSET",
        reverb_level / set_reverb_level: float = "REVERBLEVEL",
        pfx_name / set_pfx_name: string = "PFXNAME",
    }
}

instance_schema! {
    /// Sound engine settings (`C_SNDSYS_CFG`).
    pub struct SoundSystem => SoundSystem {
        volume / set_volume: float = "VOLUME",
        bit_resolution / set_bit_resolution: int = "BITRESOLUTION",
        sample_rate / set_sample_rate: int = "SAMPLERATE",
        use_stereo / set_use_stereo: int = "USESTEREO",
        num_sfx_channels / set_num_sfx_channels: int = "NUMSFXCHANNELS",
        used_3d_provider_name / set_used_3d_provider_name: string = "USED3DPROVIDERNAME",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, ScriptBuilder};
    use crate::vm::{DaedalusVm, InstanceType};

    #[test]
    fn float_members_round_trip_through_script_and_host() {
        let mut b = ScriptBuilder::new();
        let class = b.class(
            "C_MUSICTHEME",
            &[("FILE", DataType::String, 1), ("VOL", DataType::Float, 1), ("TRANSTYPE", DataType::Int, 1)],
        );
        let mut theme = b.instance("SYS_MENU", class);
        theme.set_string(class + 1, "gamestart.sgt").set_float(class + 2, 0.75).set_int(class + 3, 6);
        theme.finish();

        let mut vm = DaedalusVm::new(b.load().unwrap());
        let h = vm.init_instance("SYS_MENU", InstanceType::MusicTheme).unwrap();
        vm.view_mut::<MusicTheme>(h).unwrap().set_vol(0.5).unwrap();

        let view = vm.view::<MusicTheme>(h).unwrap();
        assert_eq!(view.file().unwrap(), "gamestart.sgt");
        assert_eq!(view.vol().unwrap(), 0.5);
        assert_eq!(view.trans_type().unwrap(), Some(MusicTransitionEffect::End));
        assert_eq!(view.reverb_mix().unwrap(), 0.0);
    }
}
