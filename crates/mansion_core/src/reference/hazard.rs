//! Hazard scores (0 = low, 5 = high) per municipality, derived from the
//! GSI hazard map portal.

use serde::{Deserialize, Serialize};

/// Flood, tsunami and landslide scores for one area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HazardScores {
    pub flood: u8,
    pub tsunami: u8,
    pub landslide: u8,
}

impl HazardScores {
    pub const fn new(flood: u8, tsunami: u8, landslide: u8) -> Self {
        Self {
            flood,
            tsunami,
            landslide,
        }
    }
}

/// Used when neither the municipality nor the prefecture is known.
pub const GLOBAL_DEFAULT: HazardScores = HazardScores::new(2, 1, 1);

/// Upper bound of every component score
pub const MAX_SCORE: u8 = 5;

pub(crate) const MUNICIPALITIES: &[(&str, HazardScores)] = &[
    // Osaka
    ("大阪市中央区", HazardScores::new(2, 1, 0)),
    ("大阪市北区", HazardScores::new(2, 0, 0)),
    ("大阪市天王寺区", HazardScores::new(1, 0, 1)),
    ("大阪市浪速区", HazardScores::new(2, 1, 0)),
    ("大阪市西区", HazardScores::new(3, 2, 0)),
    ("大阪市港区", HazardScores::new(3, 3, 0)),
    ("大阪市此花区", HazardScores::new(4, 4, 0)),
    ("大阪市住之江区", HazardScores::new(3, 3, 0)),
    ("堺市堺区", HazardScores::new(2, 2, 0)),
    ("堺市北区", HazardScores::new(1, 0, 1)),
    ("豊中市", HazardScores::new(2, 0, 1)),
    ("吹田市", HazardScores::new(2, 0, 1)),
    ("高槻市", HazardScores::new(2, 0, 2)),
    ("枚方市", HazardScores::new(3, 0, 2)),
    ("茨木市", HazardScores::new(2, 0, 2)),
    ("八尾市", HazardScores::new(2, 0, 1)),
    ("東大阪市", HazardScores::new(2, 0, 1)),
    ("岸和田市", HazardScores::new(2, 2, 1)),
    // Kyoto
    ("京都市中京区", HazardScores::new(2, 0, 0)),
    ("京都市下京区", HazardScores::new(2, 0, 0)),
    ("京都市東山区", HazardScores::new(1, 0, 2)),
    ("京都市左京区", HazardScores::new(2, 0, 3)),
    ("京都市右京区", HazardScores::new(2, 0, 2)),
    ("京都市伏見区", HazardScores::new(3, 0, 1)),
    ("宇治市", HazardScores::new(3, 0, 2)),
    ("長岡京市", HazardScores::new(2, 0, 1)),
    ("亀岡市", HazardScores::new(3, 0, 2)),
    ("福知山市", HazardScores::new(4, 0, 2)),
    // Hyogo
    ("神戸市中央区", HazardScores::new(2, 2, 2)),
    ("神戸市東灘区", HazardScores::new(2, 1, 3)),
    ("神戸市灘区", HazardScores::new(2, 1, 3)),
    ("神戸市兵庫区", HazardScores::new(2, 2, 2)),
    ("神戸市長田区", HazardScores::new(2, 2, 2)),
    ("神戸市須磨区", HazardScores::new(2, 2, 3)),
    ("神戸市垂水区", HazardScores::new(2, 2, 2)),
    ("西宮市", HazardScores::new(2, 1, 2)),
    ("芦屋市", HazardScores::new(2, 1, 3)),
    ("尼崎市", HazardScores::new(3, 3, 0)),
    ("明石市", HazardScores::new(2, 2, 1)),
    ("姫路市", HazardScores::new(2, 2, 1)),
    ("宝塚市", HazardScores::new(2, 0, 3)),
    ("川西市", HazardScores::new(2, 0, 2)),
    ("伊丹市", HazardScores::new(2, 0, 1)),
    // Nara
    ("奈良市", HazardScores::new(2, 0, 2)),
    ("生駒市", HazardScores::new(1, 0, 2)),
    ("橿原市", HazardScores::new(2, 0, 1)),
    ("大和郡山市", HazardScores::new(2, 0, 1)),
    ("天理市", HazardScores::new(2, 0, 1)),
    ("桜井市", HazardScores::new(2, 0, 2)),
    ("王寺町", HazardScores::new(2, 0, 1)),
    // Shiga
    ("大津市", HazardScores::new(2, 0, 2)),
    ("草津市", HazardScores::new(2, 0, 1)),
    ("守山市", HazardScores::new(2, 0, 0)),
    ("近江八幡市", HazardScores::new(3, 0, 1)),
    ("彦根市", HazardScores::new(2, 0, 1)),
    ("長浜市", HazardScores::new(3, 0, 2)),
    ("野洲市", HazardScores::new(2, 0, 1)),
    // Wakayama
    ("和歌山市", HazardScores::new(3, 4, 2)),
    ("田辺市", HazardScores::new(3, 3, 3)),
    ("橋本市", HazardScores::new(2, 0, 2)),
    ("海南市", HazardScores::new(3, 3, 2)),
    ("新宮市", HazardScores::new(3, 4, 3)),
    ("白浜町", HazardScores::new(2, 3, 2)),
];

pub(crate) const PREFECTURE_DEFAULTS: &[(&str, HazardScores)] = &[
    ("大阪府", HazardScores::new(2, 1, 1)),
    ("京都府", HazardScores::new(2, 0, 2)),
    ("兵庫県", HazardScores::new(2, 2, 2)),
    ("奈良県", HazardScores::new(2, 0, 2)),
    ("滋賀県", HazardScores::new(2, 0, 1)),
    ("和歌山県", HazardScores::new(3, 3, 2)),
];
