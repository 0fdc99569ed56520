use strum::{Display, FromRepr};

/// `C_MENU_ITEM.TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(i32)]
#[strum(serialize_all = "snake_case")]
pub enum MenuItemType {
    Unknown = 0,
    Text = 1,
    Slider = 2,
    Input = 3,
    Cursor = 4,
    Choicebox = 5,
    Button = 6,
    Listbox = 7,
}

instance_schema! {
    /// Menus (`C_MENU`). `ITEMS` lists the names of `C_MENU_ITEM` instances.
    pub struct Menu => Menu {
        back_pic / set_back_pic: string = "BACKPIC",
        back_world / set_back_world: string = "BACKWORLD",
        pos_x / set_pos_x: int = "POSX",
        pos_y / set_pos_y: int = "POSY",
        dim_x / set_dim_x: int = "DIMX",
        dim_y / set_dim_y: int = "DIMY",
        alpha / set_alpha: int = "ALPHA",
        music_theme / set_music_theme: string = "MUSICTHEME",
        event_timer_msec / set_event_timer_msec: int = "EVENTTIMERMSEC",
        item / set_item: string[usize] = "ITEMS",
        flags / set_flags: int = "FLAGS",
        default_outgame / set_default_outgame: int = "DEFAULTOUTGAME",
        default_ingame / set_default_ingame: int = "DEFAULTINGAME",
    }
}

instance_schema! {
    /// Menu entries (`C_MENU_ITEM`).
    pub struct MenuItem => MenuItem {
        font_name / set_font_name: string = "FONTNAME",
        text / set_text: string[usize] = "TEXT",
        backpic / set_backpic: string = "BACKPIC",
        alpha_mode / set_alpha_mode: string = "ALPHAMODE",
        alpha / set_alpha: int = "ALPHA",
        raw_type / set_raw_type: int = "TYPE",
        on_sel_action / set_on_sel_action: int[usize] = "ONSELACTION",
        on_sel_action_s / set_on_sel_action_s: string[usize] = "ONSELACTION_S",
        on_chg_set_option / set_on_chg_set_option: string = "ONCHGSETOPTION",
        on_chg_set_option_section / set_on_chg_set_option_section: string = "ONCHGSETOPTIONSECTION",
        on_event_action / set_on_event_action: int[usize] = "ONEVENTACTION",
        pos_x / set_pos_x: int = "POSX",
        pos_y / set_pos_y: int = "POSY",
        dim_x / set_dim_x: int = "DIMX",
        dim_y / set_dim_y: int = "DIMY",
        size_start_scale / set_size_start_scale: float = "SIZESTARTSCALE",
        flags / set_flags: int = "FLAGS",
        open_delay_time / set_open_delay_time: float = "OPENDELAYTIME",
        open_duration / set_open_duration: float = "OPENDURATION",
        user_float / set_user_float: float[usize] = "USERFLOAT",
        user_string / set_user_string: string[usize] = "USERSTRING",
        frame_pos_x / set_frame_pos_x: int = "FRAMEPOSX",
        frame_pos_y / set_frame_pos_y: int = "FRAMEPOSY",
        frame_size_x / set_frame_size_x: int = "FRAMESIZEX",
        frame_size_y / set_frame_size_y: int = "FRAMESIZEY",
        hide_if_option_section_set / set_hide_if_option_section_set: string = "HIDEIFOPTIONSECTIONSET",
        hide_if_option_set / set_hide_if_option_set: string = "HIDEIFOPTIONSET",
        hide_on_value / set_hide_on_value: int = "HIDEONVALUE",
    }
}

impl super::InstanceView<'_, MenuItem> {
    /// `None` for values outside the known item kinds.
    pub fn item_type(&self) -> crate::error::Result<Option<MenuItemType>> {
        Ok(MenuItemType::from_repr(self.raw_type()?))
    }
}
