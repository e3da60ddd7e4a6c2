//! Fixed transliteration tables for the Vietnamese letter repertoire
//!
//! Rows list a vowel base in tone order: level, grave (huyền), hook (hỏi),
//! tilde (ngã), acute (sắc), dot below (nặng). The three tables are parallel:
//! `UNICODE_ROWS[r][t]` is written as `VNI_ROWS[r][t]` and `TCVN3_ROWS[r][t]`.

/// Number of tone slots per vowel row
pub const TONES: usize = 6;

pub const UNICODE_ROWS: [[char; TONES]; 24] = [
    ['a', 'à', 'ả', 'ã', 'á', 'ạ'],
    ['ă', 'ằ', 'ẳ', 'ẵ', 'ắ', 'ặ'],
    ['â', 'ầ', 'ẩ', 'ẫ', 'ấ', 'ậ'],
    ['e', 'è', 'ẻ', 'ẽ', 'é', 'ẹ'],
    ['ê', 'ề', 'ể', 'ễ', 'ế', 'ệ'],
    ['i', 'ì', 'ỉ', 'ĩ', 'í', 'ị'],
    ['o', 'ò', 'ỏ', 'õ', 'ó', 'ọ'],
    ['ô', 'ồ', 'ổ', 'ỗ', 'ố', 'ộ'],
    ['ơ', 'ờ', 'ở', 'ỡ', 'ớ', 'ợ'],
    ['u', 'ù', 'ủ', 'ũ', 'ú', 'ụ'],
    ['ư', 'ừ', 'ử', 'ữ', 'ứ', 'ự'],
    ['y', 'ỳ', 'ỷ', 'ỹ', 'ý', 'ỵ'],
    ['A', 'À', 'Ả', 'Ã', 'Á', 'Ạ'],
    ['Ă', 'Ằ', 'Ẳ', 'Ẵ', 'Ắ', 'Ặ'],
    ['Â', 'Ầ', 'Ẩ', 'Ẫ', 'Ấ', 'Ậ'],
    ['E', 'È', 'Ẻ', 'Ẽ', 'É', 'Ẹ'],
    ['Ê', 'Ề', 'Ể', 'Ễ', 'Ế', 'Ệ'],
    ['I', 'Ì', 'Ỉ', 'Ĩ', 'Í', 'Ị'],
    ['O', 'Ò', 'Ỏ', 'Õ', 'Ó', 'Ọ'],
    ['Ô', 'Ồ', 'Ổ', 'Ỗ', 'Ố', 'Ộ'],
    ['Ơ', 'Ờ', 'Ở', 'Ỡ', 'Ớ', 'Ợ'],
    ['U', 'Ù', 'Ủ', 'Ũ', 'Ú', 'Ụ'],
    ['Ư', 'Ừ', 'Ử', 'Ữ', 'Ứ', 'Ự'],
    ['Y', 'Ỳ', 'Ỷ', 'Ỹ', 'Ý', 'Ỵ'],
];

/// Letters outside the vowel rows: đ, Đ
pub const UNICODE_EXTRA: [char; 2] = ['đ', 'Đ'];

// VNI Windows writes most letters as a base letter plus a mark code unit.
// ơ, ư, đ, the i family and ỵ are single code units.
pub const VNI_ROWS: [[&str; TONES]; 24] = [
    ["a", "aø", "aû", "aõ", "aù", "aï"],
    ["aê", "aè", "aú", "aü", "aé", "aë"],
    ["aâ", "aà", "aå", "aã", "aá", "aä"],
    ["e", "eø", "eû", "eõ", "eù", "eï"],
    ["eâ", "eà", "eå", "eã", "eá", "eä"],
    ["i", "ì", "æ", "ó", "í", "ò"],
    ["o", "oø", "oû", "oõ", "où", "oï"],
    ["oâ", "oà", "oå", "oã", "oá", "oä"],
    ["ô", "ôø", "ôû", "ôõ", "ôù", "ôï"],
    ["u", "uø", "uû", "uõ", "uù", "uï"],
    ["ö", "öø", "öû", "öõ", "öù", "öï"],
    ["y", "yø", "yû", "yõ", "yù", "î"],
    ["A", "AØ", "AÛ", "AÕ", "AÙ", "AÏ"],
    ["AÊ", "AÈ", "AÚ", "AÜ", "AÉ", "AË"],
    ["AÂ", "AÀ", "AÅ", "AÃ", "AÁ", "AÄ"],
    ["E", "EØ", "EÛ", "EÕ", "EÙ", "EÏ"],
    ["EÂ", "EÀ", "EÅ", "EÃ", "EÁ", "EÄ"],
    ["I", "Ì", "Æ", "Ó", "Í", "Ò"],
    ["O", "OØ", "OÛ", "OÕ", "OÙ", "OÏ"],
    ["OÂ", "OÀ", "OÅ", "OÃ", "OÁ", "OÄ"],
    ["Ô", "ÔØ", "ÔÛ", "ÔÕ", "ÔÙ", "ÔÏ"],
    ["U", "UØ", "UÛ", "UÕ", "UÙ", "UÏ"],
    ["Ö", "ÖØ", "ÖÛ", "ÖÕ", "ÖÙ", "ÖÏ"],
    ["Y", "YØ", "YÛ", "YÕ", "YÙ", "Î"],
];

pub const VNI_EXTRA: [&str; 2] = ["ñ", "Ñ"];

// TCVN3 (ABC) code points. Lowercase letters and the base capitals Ă Â Ê Ô
// Ơ Ư Đ sit at their standard positions. TCVN3 has no toned capitals, so
// those fill the rest of 0x80..=0xFF; the six that no longer fit (Ự and the
// toned Y row) go to the Private Use Area at U+E000.
pub const TCVN3_ROWS: [[u16; TONES]; 24] = [
    [0x61, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9],
    [0xA8, 0xBB, 0xBC, 0xBD, 0xBE, 0xC6],
    [0xA9, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB],
    [0x65, 0xCC, 0xCE, 0xCF, 0xD0, 0xD1],
    [0xAA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6],
    [0x69, 0xD7, 0xD8, 0xDC, 0xDD, 0xDE],
    [0x6F, 0xDF, 0xE1, 0xE2, 0xE3, 0xE4],
    [0xAB, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9],
    [0xAC, 0xEA, 0xEB, 0xEC, 0xED, 0xEE],
    [0x75, 0xEF, 0xF1, 0xF2, 0xF3, 0xF4],
    [0xAD, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9],
    [0x79, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE],
    [0x41, 0x80, 0x81, 0x82, 0x83, 0x84],
    [0xA1, 0x85, 0x86, 0x87, 0x88, 0x89],
    [0xA2, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E],
    [0x45, 0x8F, 0x90, 0x91, 0x92, 0x93],
    [0xA3, 0x94, 0x95, 0x96, 0x97, 0x98],
    [0x49, 0x99, 0x9A, 0x9B, 0x9C, 0x9D],
    [0x4F, 0x9E, 0x9F, 0xA0, 0xAF, 0xB0],
    [0xA4, 0xB1, 0xB2, 0xB3, 0xB4, 0xBA],
    [0xA5, 0xBF, 0xC0, 0xC1, 0xC2, 0xC3],
    [0x55, 0xC4, 0xC5, 0xCD, 0xD9, 0xDA],
    [0xA6, 0xDB, 0xE0, 0xF0, 0xFF, 0xE000],
    [0x59, 0xE001, 0xE002, 0xE003, 0xE004, 0xE005],
];

pub const TCVN3_EXTRA: [u16; 2] = [0xAE, 0xA7];
