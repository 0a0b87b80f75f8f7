//! Average mansion trade price per ㎡ (yen), by municipality and by
//! prefecture.

/// Used when the prefecture itself is unknown.
pub const GLOBAL_DEFAULT_PRICE: u32 = 350_000;

pub(crate) const MUNICIPALITIES: &[(&str, u32)] = &[
    // Osaka
    ("大阪市北区", 850_000),
    ("大阪市中央区", 780_000),
    ("大阪市西区", 720_000),
    ("大阪市天王寺区", 680_000),
    ("大阪市福島区", 650_000),
    ("大阪市浪速区", 600_000),
    ("大阪市都島区", 500_000),
    ("大阪市淀川区", 480_000),
    ("吹田市", 450_000),
    ("豊中市", 420_000),
    ("茨木市", 360_000),
    ("堺市北区", 350_000),
    ("堺市堺区", 330_000),
    ("高槻市", 330_000),
    ("枚方市", 280_000),
    ("東大阪市", 280_000),
    // Kyoto
    ("京都市中京区", 750_000),
    ("京都市下京区", 700_000),
    ("京都市東山区", 620_000),
    ("京都市上京区", 600_000),
    ("京都市左京区", 550_000),
    ("京都市右京区", 420_000),
    ("京都市伏見区", 380_000),
    ("長岡京市", 350_000),
    ("宇治市", 280_000),
    // Hyogo
    ("神戸市中央区", 620_000),
    ("芦屋市", 550_000),
    ("神戸市東灘区", 480_000),
    ("西宮市", 480_000),
    ("神戸市灘区", 430_000),
    ("尼崎市", 380_000),
    ("明石市", 330_000),
    ("宝塚市", 330_000),
    ("姫路市", 270_000),
    // Nara
    ("奈良市", 300_000),
    ("生駒市", 280_000),
    ("橿原市", 230_000),
    // Shiga
    ("草津市", 340_000),
    ("大津市", 300_000),
    ("守山市", 280_000),
    // Wakayama
    ("和歌山市", 230_000),
    ("田辺市", 170_000),
];

pub(crate) const PREFECTURE_DEFAULTS: &[(&str, u32)] = &[
    ("大阪府", 450_000),
    ("京都府", 420_000),
    ("兵庫県", 380_000),
    ("奈良県", 280_000),
    ("滋賀県", 260_000),
    ("和歌山県", 220_000),
];
