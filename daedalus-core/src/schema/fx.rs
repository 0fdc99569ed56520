instance_schema! {
    /// Particle emitters (`C_PARTICLEFX`). Members ending in `_s` hold unparsed value lists.
    pub struct ParticleEffect => ParticleEffect {
        pps_value / set_pps_value: float = "PPSVALUE",
        pps_scale_keys_s / set_pps_scale_keys_s: string = "PPSSCALEKEYS_S",
        pps_is_looping / set_pps_is_looping: int = "PPSISLOOPING",
        pps_is_smooth / set_pps_is_smooth: int = "PPSISSMOOTH",
        pps_fps / set_pps_fps: float = "PPSFPS",
        pps_create_em_s / set_pps_create_em_s: string = "PPSCREATEEM_S",
        pps_create_em_delay / set_pps_create_em_delay: float = "PPSCREATEEMDELAY",
        shp_type_s / set_shp_type_s: string = "SHPTYPE_S",
        shp_for_s / set_shp_for_s: string = "SHPFOR_S",
        shp_offset_vec_s / set_shp_offset_vec_s: string = "SHPOFFSETVEC_S",
        shp_distrib_type_s / set_shp_distrib_type_s: string = "SHPDISTRIBTYPE_S",
        shp_distrib_walk_speed / set_shp_distrib_walk_speed: float = "SHPDISTRIBWALKSPEED",
        shp_is_volume / set_shp_is_volume: int = "SHPISVOLUME",
        shp_dim_s / set_shp_dim_s: string = "SHPDIM_S",
        shp_mesh_s / set_shp_mesh_s: string = "SHPMESH_S",
        shp_mesh_render_b / set_shp_mesh_render_b: int = "SHPMESHRENDER_B",
        shp_scale_keys_s / set_shp_scale_keys_s: string = "SHPSCALEKEYS_S",
        shp_scale_is_looping / set_shp_scale_is_looping: int = "SHPSCALEISLOOPING",
        shp_scale_is_smooth / set_shp_scale_is_smooth: int = "SHPSCALEISSMOOTH",
        shp_scale_fps / set_shp_scale_fps: float = "SHPSCALEFPS",
        dir_mode_s / set_dir_mode_s: string = "DIRMODE_S",
        dir_for_s / set_dir_for_s: string = "DIRFOR_S",
        dir_mode_target_for_s / set_dir_mode_target_for_s: string = "DIRMODETARGETFOR_S",
        dir_mode_target_pos_s / set_dir_mode_target_pos_s: string = "DIRMODETARGETPOS_S",
        dir_angle_head / set_dir_angle_head: float = "DIRANGLEHEAD",
        dir_angle_head_var / set_dir_angle_head_var: float = "DIRANGLEHEADVAR",
        dir_angle_elev / set_dir_angle_elev: float = "DIRANGLEELEV",
        dir_angle_elev_var / set_dir_angle_elev_var: float = "DIRANGLEELEVVAR",
        vel_avg / set_vel_avg: float = "VELAVG",
        vel_var / set_vel_var: float = "VELVAR",
        lsp_part_avg / set_lsp_part_avg: float = "LSPPARTAVG",
        lsp_part_var / set_lsp_part_var: float = "LSPPARTVAR",
        fly_gravity_s / set_fly_gravity_s: string = "FLYGRAVITY_S",
        fly_colldet_b / set_fly_colldet_b: int = "FLYCOLLDET_B",
        vis_name_s / set_vis_name_s: string = "VISNAME_S",
        vis_orientation_s / set_vis_orientation_s: string = "VISORIENTATION_S",
        vis_tex_is_quadpoly / set_vis_tex_is_quadpoly: int = "VISTEXISQUADPOLY",
        vis_tex_ani_fps / set_vis_tex_ani_fps: float = "VISTEXANIFPS",
        vis_tex_ani_is_looping / set_vis_tex_ani_is_looping: int = "VISTEXANIISLOOPING",
        vis_tex_color_start_s / set_vis_tex_color_start_s: string = "VISTEXCOLORSTART_S",
        vis_tex_color_end_s / set_vis_tex_color_end_s: string = "VISTEXCOLOREND_S",
        vis_size_start_s / set_vis_size_start_s: string = "VISSIZESTART_S",
        vis_size_end_scale / set_vis_size_end_scale: float = "VISSIZEENDSCALE",
        vis_alpha_func_s / set_vis_alpha_func_s: string = "VISALPHAFUNC_S",
        vis_alpha_start / set_vis_alpha_start: float = "VISALPHASTART",
        vis_alpha_end / set_vis_alpha_end: float = "VISALPHAEND",
        trl_fade_speed / set_trl_fade_speed: float = "TRLFADESPEED",
        trl_texture_s / set_trl_texture_s: string = "TRLTEXTURE_S",
        trl_width / set_trl_width: float = "TRLWIDTH",
        mrk_fade_speed / set_mrk_fade_speed: float = "MRKFADESPEED",
        mrk_texture_s / set_mrk_texture_s: string = "MRKTEXTURE_S",
        mrk_size / set_mrk_size: float = "MRKSIZE",
        flock_mode / set_flock_mode: string = "FLOCKMODE",
        flock_strength / set_flock_strength: float = "FLOCKSTRENGTH",
        use_emitters_for / set_use_emitters_for: int = "USEEMITTERSFOR",
        time_start_end_s / set_time_start_end_s: string = "TIMESTARTEND_S",
        m_bis_ambient_pfx / set_m_bis_ambient_pfx: int = "M_BISAMBIENTPFX",
    }
}

instance_schema! {
    /// Spell and visual effects (`CFX_BASE`).
    pub struct EffectBase => EffectBase {
        vis_name_s / set_vis_name_s: string = "VISNAME_S",
        vis_size_s / set_vis_size_s: string = "VISSIZE_S",
        vis_alpha / set_vis_alpha: float = "VISALPHA",
        vis_alpha_blend_func_s / set_vis_alpha_blend_func_s: string = "VISALPHABLENDFUNC_S",
        vis_tex_ani_fps / set_vis_tex_ani_fps: float = "VISTEXANIFPS",
        vis_tex_ani_is_looping / set_vis_tex_ani_is_looping: int = "VISTEXANIISLOOPING",
        em_trj_mode_s / set_em_trj_mode_s: string = "EMTRJMODE_S",
        em_trj_origin_node / set_em_trj_origin_node: string = "EMTRJORIGINNODE",
        em_trj_target_node / set_em_trj_target_node: string = "EMTRJTARGETNODE",
        em_trj_target_range / set_em_trj_target_range: float = "EMTRJTARGETRANGE",
        em_trj_target_azi / set_em_trj_target_azi: float = "EMTRJTARGETAZI",
        em_trj_target_elev / set_em_trj_target_elev: float = "EMTRJTARGETELEV",
        em_trj_num_keys / set_em_trj_num_keys: int = "EMTRJNUMKEYS",
        em_trj_num_keys_var / set_em_trj_num_keys_var: int = "EMTRJNUMKEYSVAR",
        em_trj_angle_elev_var / set_em_trj_angle_elev_var: float = "EMTRJANGLEELEVVAR",
        em_trj_angle_head_var / set_em_trj_angle_head_var: float = "EMTRJANGLEHEADVAR",
        em_trj_key_dist_var / set_em_trj_key_dist_var: float = "EMTRJKEYDISTVAR",
        em_trj_loop_mode_s / set_em_trj_loop_mode_s: string = "EMTRJLOOPMODE_S",
        em_trj_ease_func_s / set_em_trj_ease_func_s: string = "EMTRJEASEFUNC_S",
        em_trj_ease_vel / set_em_trj_ease_vel: float = "EMTRJEASEVEL",
        em_trj_dyn_update_delay / set_em_trj_dyn_update_delay: float = "EMTRJDYNUPDATEDELAY",
        em_trj_dyn_update_target_only / set_em_trj_dyn_update_target_only: int = "EMTRJDYNUPDATETARGETONLY",
        em_fx_create_s / set_em_fx_create_s: string = "EMFXCREATE_S",
        em_fx_invest_origin_s / set_em_fx_invest_origin_s: string = "EMFXINVESTORIGIN_S",
        em_fx_invest_target_s / set_em_fx_invest_target_s: string = "EMFXINVESTTARGET_S",
        em_fx_trigger_delay / set_em_fx_trigger_delay: float = "EMFXTRIGGERDELAY",
        em_fx_create_down_trj / set_em_fx_create_down_trj: int = "EMFXCREATEDOWNTRJ",
        em_action_coll_dyn_s / set_em_action_coll_dyn_s: string = "EMACTIONCOLLDYN_S",
        em_action_coll_stat_s / set_em_action_coll_stat_s: string = "EMACTIONCOLLSTAT_S",
        em_fx_coll_stat_s / set_em_fx_coll_stat_s: string = "EMFXCOLLSTAT_S",
        em_fx_coll_dyn_s / set_em_fx_coll_dyn_s: string = "EMFXCOLLDYN_S",
        em_fx_coll_stat_align_s / set_em_fx_coll_stat_align_s: string = "EMFXCOLLSTATALIGN_S",
        em_fx_coll_dyn_align_s / set_em_fx_coll_dyn_align_s: string = "EMFXCOLLDYNALIGN_S",
        em_fx_lifespan / set_em_fx_lifespan: float = "EMFXLIFESPAN",
        em_check_collision / set_em_check_collision: int = "EMCHECKCOLLISION",
        em_adjust_shp_to_origin / set_em_adjust_shp_to_origin: int = "EMADJUSTSHPTOORIGIN",
        em_invest_next_key_duration / set_em_invest_next_key_duration: float = "EMINVESTNEXTKEYDURATION",
        em_fly_gravity / set_em_fly_gravity: float = "EMFLYGRAVITY",
        em_self_rot_vel_s / set_em_self_rot_vel_s: string = "EMSELFROTVEL_S",
        user_string / set_user_string: string[usize] = "USERSTRING",
        light_preset_name / set_light_preset_name: string = "LIGHTPRESETNAME",
        sfx_id / set_sfx_id: string = "SFXID",
        sfx_is_ambient / set_sfx_is_ambient: int = "SFXISAMBIENT",
        send_assess_magic / set_send_assess_magic: int = "SENDASSESSMAGIC",
        secs_per_damage / set_secs_per_damage: float = "SECSPERDAMAGE",
        em_fx_coll_dyn_perc_s / set_em_fx_coll_dyn_perc_s: string = "EMFXCOLLDYNPERC_S",
    }
}

instance_schema! {
    /// Per-key overrides of an effect (`C_PARTICLEFXEMITKEY`).
    pub struct ParticleEffectEmitKey => ParticleEffectEmitKey {
        vis_name_s / set_vis_name_s: string = "VISNAME_S",
        vis_size_scale / set_vis_size_scale: float = "VISSIZESCALE",
        scale_duration / set_scale_duration: float = "SCALEDURATION",
        pfx_pps_value / set_pfx_pps_value: float = "PFX_PPSVALUE",
        pfx_pps_is_smooth_chg / set_pfx_pps_is_smooth_chg: int = "PFX_PPSISSMOOTHCHG",
        pfx_pps_is_looping_chg / set_pfx_pps_is_looping_chg: int = "PFX_PPSISLOOPINGCHG",
        pfx_sc_time / set_pfx_sc_time: float = "PFX_SCTIME",
        pfx_fly_gravity_s / set_pfx_fly_gravity_s: string = "PFX_FLYGRAVITY_S",
        pfx_shp_dim_s / set_pfx_shp_dim_s: string = "PFX_SHPDIM_S",
        pfx_shp_is_volume_chg / set_pfx_shp_is_volume_chg: int = "PFX_SHPISVOLUMECHG",
        pfx_shp_scale_fps / set_pfx_shp_scale_fps: float = "PFX_SHPSCALEFPS",
        pfx_shp_distrib_walk_speed / set_pfx_shp_distrib_walk_speed: float = "PFX_SHPDISTRIBWALKSPEED",
        pfx_shp_offset_vec_s / set_pfx_shp_offset_vec_s: string = "PFX_SHPOFFSETVEC_S",
        pfx_shp_distrib_type_s / set_pfx_shp_distrib_type_s: string = "PFX_SHPDISTRIBTYPE_S",
        pfx_dir_mode_s / set_pfx_dir_mode_s: string = "PFX_DIRMODE_S",
        pfx_dir_for_s / set_pfx_dir_for_s: string = "PFX_DIRFOR_S",
        pfx_dir_mode_target_for_s / set_pfx_dir_mode_target_for_s: string = "PFX_DIRMODETARGETFOR_S",
        pfx_dir_mode_target_pos_s / set_pfx_dir_mode_target_pos_s: string = "PFX_DIRMODETARGETPOS_S",
        pfx_vel_avg / set_pfx_vel_avg: float = "PFX_VELAVG",
        pfx_lsp_part_avg / set_pfx_lsp_part_avg: float = "PFX_LSPPARTAVG",
        pfx_vis_alpha_start / set_pfx_vis_alpha_start: float = "PFX_VISALPHASTART",
        light_preset_name / set_light_preset_name: string = "LIGHTPRESETNAME",
        light_range / set_light_range: float = "LIGHTRANGE",
        sfx_id / set_sfx_id: string = "SFXID",
        sfx_is_ambient / set_sfx_is_ambient: int = "SFXISAMBIENT",
        em_create_fx_id / set_em_create_fx_id: string = "EMCREATEFXID",
        em_fly_gravity / set_em_fly_gravity: float = "EMFLYGRAVITY",
        em_self_rot_vel_s / set_em_self_rot_vel_s: string = "EMSELFROTVEL_S",
        em_trj_mode_s / set_em_trj_mode_s: string = "EMTRJMODE_S",
        em_trj_ease_vel / set_em_trj_ease_vel: float = "EMTRJEASEVEL",
        em_check_collision / set_em_check_collision: int = "EMCHECKCOLLISION",
        em_fx_lifespan / set_em_fx_lifespan: float = "EMFXLIFESPAN",
    }
}
