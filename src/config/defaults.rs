pub const DEFAULT_WAKE_WORD: &str = "hark";
pub const DEFAULT_FRAME_MS: u64 = 50;
pub const DEFAULT_PAUSE_MS: u64 = 1_500;
pub const DEFAULT_MAX_CAPTURE_MS: u64 = 10_000;
pub const DEFAULT_BUFFER_MS: u64 = 10_000;
pub const DEFAULT_TICK_MS: u64 = 100;
pub const DEFAULT_CALIBRATION_SECS: u64 = 5;
pub const DEFAULT_CALIBRATION_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_THRESHOLD_MULTIPLIER: f32 = 2.0;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub(super) const MAX_CAPTURE_HARD_LIMIT_MS: u64 = 60_000;
pub(super) const MAX_BUFFER_MS: u64 = 120_000;

pub(super) const ISO_639_1_CODES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
    "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
    "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja",
    "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw",
    "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml",
    "mn", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
    "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro",
    "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr",
    "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr",
    "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
    "yo", "za", "zh", "zu",
];
