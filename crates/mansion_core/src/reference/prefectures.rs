//! Kansai prefecture registry
//!
//! Local codes 1-6 are the model's categorical encoding; JIS codes are what
//! the transactions API expects.

use serde::{Deserialize, Serialize};

/// One prefecture with the address fragments that identify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prefecture {
    /// Local feature code (1-6)
    pub code: u8,
    /// JIS X 0401 code used by the transactions API
    pub jis_code: String,
    /// Full name, e.g. "大阪府"
    pub name: String,
    /// Shorter fragments that also identify the prefecture (city names)
    #[serde(default)]
    pub aliases: Vec<String>,
}

pub(crate) fn builtin() -> Vec<Prefecture> {
    [
        (1, "27", "大阪府", &["大阪市"][..]),
        (2, "26", "京都府", &[][..]),
        (3, "28", "兵庫県", &[][..]),
        (4, "29", "奈良県", &[][..]),
        (5, "25", "滋賀県", &[][..]),
        (6, "30", "和歌山県", &["和歌山市"][..]),
    ]
    .into_iter()
    .map(|(code, jis, name, aliases)| Prefecture {
        code,
        jis_code: jis.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    })
    .collect()
}
