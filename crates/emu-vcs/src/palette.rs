//! Television colour palettes.
//!
//! The TIA's colour registers hold a 7-bit value: four bits of hue and
//! three of luminance. Each specification maps those 128 values to ARGB.

/// NTSC palette: hue 0 is the grey ramp, hues 1-15 rotate from
/// gold through green, blue and back to red, washing out as luminance
/// rises.
pub const NTSC: [u32; 128] = [
    0xFF2E2E2E, 0xFF494949, 0xFF656565, 0xFF808080,
    0xFF9B9B9B, 0xFFB7B7B7, 0xFFD2D2D2, 0xFFEDEDED,
    0xFF473015, 0xFF6F4D24, 0xFF946935, 0xFFB78549,
    0xFFC29F74, 0xFFD0B99D, 0xFFE0D3C4, 0xFFF2EEE8,
    0xFF474515, 0xFF6F6B24, 0xFF948F35, 0xFFB7B149,
    0xFFC2BE74, 0xFFD0CD9D, 0xFFE0DEC4, 0xFFF2F1E8,
    0xFF354715, 0xFF546F24, 0xFF739435, 0xFF90B749,
    0xFFA7C274, 0xFFBED09D, 0xFFD6E0C4, 0xFFEFF2E8,
    0xFF214715, 0xFF376F24, 0xFF4D9435, 0xFF65B749,
    0xFF88C274, 0xFFAAD09D, 0xFFCBE0C4, 0xFFEBF2E8,
    0xFF15471C, 0xFF246F2F, 0xFF359443, 0xFF49B75A,
    0xFF74C280, 0xFF9DD0A5, 0xFFC4E0C8, 0xFFE8F2EA,
    0xFF154730, 0xFF246F4D, 0xFF359469, 0xFF49B785,
    0xFF74C29F, 0xFF9DD0B9, 0xFFC4E0D3, 0xFFE8F2EE,
    0xFF154745, 0xFF246F6B, 0xFF35948F, 0xFF49B7B1,
    0xFF74C2BE, 0xFF9DD0CD, 0xFFC4E0DE, 0xFFE8F2F1,
    0xFF153547, 0xFF24546F, 0xFF357394, 0xFF4990B7,
    0xFF74A7C2, 0xFF9DBED0, 0xFFC4D6E0, 0xFFE8EFF2,
    0xFF152147, 0xFF24376F, 0xFF354D94, 0xFF4965B7,
    0xFF7488C2, 0xFF9DAAD0, 0xFFC4CBE0, 0xFFE8EBF2,
    0xFF1C1547, 0xFF2F246F, 0xFF433594, 0xFF5A49B7,
    0xFF8074C2, 0xFFA59DD0, 0xFFC8C4E0, 0xFFEAE8F2,
    0xFF301547, 0xFF4D246F, 0xFF693594, 0xFF8549B7,
    0xFF9F74C2, 0xFFB99DD0, 0xFFD3C4E0, 0xFFEEE8F2,
    0xFF451547, 0xFF6B246F, 0xFF8F3594, 0xFFB149B7,
    0xFFBE74C2, 0xFFCD9DD0, 0xFFDEC4E0, 0xFFF1E8F2,
    0xFF471535, 0xFF6F2454, 0xFF943573, 0xFFB74990,
    0xFFC274A7, 0xFFD09DBE, 0xFFE0C4D6, 0xFFF2E8EF,
    0xFF471521, 0xFF6F2437, 0xFF94354D, 0xFFB74965,
    0xFFC27488, 0xFFD09DAA, 0xFFE0C4CB, 0xFFF2E8EB,
    0xFF471C15, 0xFF6F2F24, 0xFF944335, 0xFFB75A49,
    0xFFC28074, 0xFFD0A59D, 0xFFE0C8C4, 0xFFF2EAE8,
];

/// PAL palette: hues 2-13 carry colour; 0, 1, 14 and 15 collapse to
/// the grey ramp.
pub const PAL: [u32; 128] = [
    0xFF2E2E2E, 0xFF494949, 0xFF656565, 0xFF808080,
    0xFF9B9B9B, 0xFFB7B7B7, 0xFFD2D2D2, 0xFFEDEDED,
    0xFF2E2E2E, 0xFF494949, 0xFF656565, 0xFF808080,
    0xFF9B9B9B, 0xFFB7B7B7, 0xFFD2D2D2, 0xFFEDEDED,
    0xFF453D17, 0xFF6B6028, 0xFF8F813A, 0xFFB0A050,
    0xFFBDB279, 0xFFCCC5A1, 0xFFDEDAC6, 0xFFF1F0E9,
    0xFF364517, 0xFF546B28, 0xFF738F3A, 0xFF90B050,
    0xFFA6BD79, 0xFFBECCA1, 0xFFD6DEC6, 0xFFEEF1E9,
    0xFF1F4517, 0xFF336B28, 0xFF488F3A, 0xFF60B050,
    0xFF85BD79, 0xFFA8CCA1, 0xFFCADEC6, 0xFFEBF1E9,
    0xFF174526, 0xFF286B3E, 0xFF3A8F56, 0xFF50B070,
    0xFF79BD90, 0xFFA1CCAF, 0xFFC6DECE, 0xFFE9F1EC,
    0xFF17453D, 0xFF286B60, 0xFF3A8F81, 0xFF50B0A0,
    0xFF79BDB2, 0xFFA1CCC5, 0xFFC6DEDA, 0xFFE9F1F0,
    0xFF173645, 0xFF28546B, 0xFF3A738F, 0xFF5090B0,
    0xFF79A6BD, 0xFFA1BECC, 0xFFC6D6DE, 0xFFE9EEF1,
    0xFF171F45, 0xFF28336B, 0xFF3A488F, 0xFF5060B0,
    0xFF7985BD, 0xFFA1A8CC, 0xFFC6CADE, 0xFFE9EBF1,
    0xFF261745, 0xFF3E286B, 0xFF563A8F, 0xFF7050B0,
    0xFF9079BD, 0xFFAFA1CC, 0xFFCEC6DE, 0xFFECE9F1,
    0xFF3D1745, 0xFF60286B, 0xFF813A8F, 0xFFA050B0,
    0xFFB279BD, 0xFFC5A1CC, 0xFFDAC6DE, 0xFFF0E9F1,
    0xFF451736, 0xFF6B2854, 0xFF8F3A73, 0xFFB05090,
    0xFFBD79A6, 0xFFCCA1BE, 0xFFDEC6D6, 0xFFF1E9EE,
    0xFF45171F, 0xFF6B2833, 0xFF8F3A48, 0xFFB05060,
    0xFFBD7985, 0xFFCCA1A8, 0xFFDEC6CA, 0xFFF1E9EB,
    0xFF452617, 0xFF6B3E28, 0xFF8F563A, 0xFFB07050,
    0xFFBD9079, 0xFFCCAFA1, 0xFFDECEC6, 0xFFF1ECE9,
    0xFF2E2E2E, 0xFF494949, 0xFF656565, 0xFF808080,
    0xFF9B9B9B, 0xFFB7B7B7, 0xFFD2D2D2, 0xFFEDEDED,
    0xFF2E2E2E, 0xFF494949, 0xFF656565, 0xFF808080,
    0xFF9B9B9B, 0xFFB7B7B7, 0xFFD2D2D2, 0xFFEDEDED,
];
