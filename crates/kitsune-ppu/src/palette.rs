//! The fixed 64-entry output palette.
//!
//! The console's composite output maps every rendered pixel to one of 64
//! colours; the table below is the decoded RGB rendition the host is
//! expected to display. The mask register's emphasis bits saturate the
//! corresponding channel on output.

/// The 64-entry colour table, as `0xRRGGBB` values.
#[rustfmt::skip]
pub const PALETTE: [u32; 64] = [
    0x65_65_65, 0x00_2D_69, 0x13_1F_7F, 0x3C_13_7C, 0x69_0B_62, 0x73_0A_37, 0x71_0F_07, 0x5A_1A_00,
    0x34_28_00, 0x0B_34_00, 0x00_3C_00, 0x00_3D_10, 0x00_38_40, 0x00_00_00, 0x00_00_00, 0x00_00_00,
    0xAE_AE_AE, 0x0F_63_B3, 0x40_51_D0, 0x78_41_CC, 0xA7_36_A9, 0xC0_34_70, 0xBD_3C_30, 0x9F_4A_00,
    0x6D_5C_00, 0x36_6D_00, 0x07_77_04, 0x00_79_3D, 0x00_72_7D, 0x00_00_00, 0x00_00_00, 0x00_00_00,
    0xFE_FE_FF, 0x5D_BC_FF, 0x8F_A1_FF, 0xC8_90_FF, 0xF7_85_FA, 0xFF_83_C0, 0xFF_8B_7F, 0xEF_9A_49,
    0xBD_AC_2C, 0x81_A8_55, 0x55_C7_53, 0x3C_C9_8C, 0x3E_C2_CD, 0x4E_4E_4E, 0x00_00_00, 0x00_00_00,
    0xFE_FE_FF, 0xBC_DF_FF, 0xD1_D8_FF, 0xE8_D1_FF, 0xFB_CD_FD, 0xFF_CC_E5, 0xFF_CF_CA, 0xF8_D5_B4,
    0xE4_DC_A8, 0xCC_E3_A9, 0xB9_E8_B8, 0xAE_E8_D0, 0xAF_E5_EA, 0xB6_B5_B6, 0x00_00_00, 0x00_00_00,
];

/// Decode a palette index (0-63) into RGB, applying the emphasis bits.
/// An emphasised channel is forced to full intensity.
#[must_use]
pub fn rgb(color: u8, red: bool, green: bool, blue: bool) -> (u8, u8, u8) {
    let value = PALETTE[usize::from(color & 0x3F)];
    let r = if red { 0xFF } else { (value >> 16) as u8 };
    let g = if green { 0xFF } else { (value >> 8) as u8 };
    let b = if blue { 0xFF } else { value as u8 };
    (r, g, b)
}
