//! Station passenger volumes (daily average boardings + alightings, FY2022)
//! and name normalization data.

use serde::{Deserialize, Serialize};

/// Representative station for a district name found in an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AreaHint {
    pub area: String,
    pub station: String,
}

pub(crate) const PASSENGERS: &[(&str, u64)] = &[
    // Osaka - JR
    ("大阪", 430_000),
    ("天王寺", 140_000),
    ("京橋", 130_000),
    ("鶴橋", 100_000),
    ("新大阪", 95_000),
    ("難波", 90_000),
    ("三ノ宮", 85_000),
    ("高槻", 65_000),
    ("茨木", 55_000),
    ("吹田", 45_000),
    ("堺市", 40_000),
    ("和泉府中", 25_000),
    // Osaka - private lines
    ("梅田", 500_000),
    ("なんば", 320_000),
    ("淀屋橋", 150_000),
    ("本町", 140_000),
    ("心斎橋", 130_000),
    ("江坂", 80_000),
    ("千里中央", 75_000),
    ("豊中", 60_000),
    ("茨木市", 50_000),
    ("高槻市", 48_000),
    ("枚方市", 70_000),
    ("寝屋川市", 45_000),
    ("守口市", 40_000),
    ("門真市", 35_000),
    ("東大阪", 30_000),
    ("八尾", 28_000),
    ("藤井寺", 25_000),
    ("堺", 60_000),
    ("堺東", 55_000),
    ("中百舌鳥", 50_000),
    ("泉大津", 20_000),
    ("岸和田", 25_000),
    ("泉佐野", 30_000),
    ("関西空港", 35_000),
    // Kyoto
    ("京都", 350_000),
    ("四条", 100_000),
    ("烏丸", 95_000),
    ("河原町", 90_000),
    ("三条", 45_000),
    ("祇園四条", 40_000),
    ("山科", 35_000),
    ("二条", 30_000),
    ("丹波橋", 35_000),
    ("桃山御陵前", 20_000),
    ("宇治", 25_000),
    ("長岡京", 30_000),
    ("向日町", 20_000),
    ("亀岡", 15_000),
    ("福知山", 10_000),
    ("舞鶴", 5_000),
    // Hyogo
    ("三宮", 250_000),
    ("神戸", 120_000),
    ("元町", 80_000),
    ("西宮北口", 85_000),
    ("尼崎", 70_000),
    ("芦屋", 40_000),
    ("西宮", 50_000),
    ("宝塚", 45_000),
    ("川西能勢口", 40_000),
    ("伊丹", 35_000),
    ("明石", 55_000),
    ("加古川", 35_000),
    ("姫路", 65_000),
    ("三田", 25_000),
    ("垂水", 30_000),
    ("須磨", 20_000),
    ("住吉", 35_000),
    ("六甲道", 40_000),
    ("灘", 25_000),
    ("春日野道", 15_000),
    ("新開地", 45_000),
    ("湊川", 30_000),
    ("板宿", 25_000),
    // Nara
    ("奈良", 45_000),
    ("近鉄奈良", 50_000),
    ("大和西大寺", 55_000),
    ("学園前", 45_000),
    ("生駒", 50_000),
    ("王寺", 30_000),
    ("天理", 15_000),
    ("桜井", 12_000),
    ("橿原神宮前", 20_000),
    ("大和八木", 25_000),
    ("高田", 18_000),
    // Shiga
    ("大津", 40_000),
    ("草津", 45_000),
    ("守山", 25_000),
    ("野洲", 18_000),
    ("近江八幡", 20_000),
    ("彦根", 18_000),
    ("長浜", 12_000),
    ("米原", 15_000),
    ("膳所", 20_000),
    ("石山", 25_000),
    ("瀬田", 22_000),
    ("南草津", 35_000),
    // Wakayama
    ("和歌山", 35_000),
    ("和歌山市", 25_000),
    ("海南", 8_000),
    ("紀三井寺", 5_000),
    ("田辺", 6_000),
    ("白浜", 4_000),
    ("新宮", 3_000),
    ("橋本", 15_000),
    ("岩出", 8_000),
];

/// Operator-prefixed and suffixed spellings mapped to the passenger-table key.
/// Keys are compared after the trailing "駅" has been removed.
pub(crate) const ALIASES: &[(&str, &str)] = &[
    ("JR難波", "難波"),
    ("近鉄難波", "なんば"),
    ("南海難波", "なんば"),
    ("大阪難波", "なんば"),
    ("地下鉄梅田", "梅田"),
    ("阪急梅田", "梅田"),
    ("阪神梅田", "梅田"),
    ("大阪梅田", "梅田"),
    ("JR三ノ宮", "三宮"),
    ("阪急三宮", "三宮"),
    ("阪神三宮", "三宮"),
    ("神戸三宮", "三宮"),
    ("JR京都", "京都"),
    ("近鉄京都", "京都"),
    ("阪急河原町", "河原町"),
    ("京阪三条", "三条"),
    ("JR奈良", "奈良"),
    ("天王寺駅前", "天王寺"),
];

/// District fragments that imply a station when no station name appears in
/// the address. Checked in this order when lengths tie.
pub(crate) const AREA_HINTS: &[(&str, &str)] = &[
    ("中央区", "本町"),
    ("北区", "梅田"),
    ("天王寺", "天王寺"),
    ("難波", "なんば"),
    ("心斎橋", "心斎橋"),
    ("中京区", "四条"),
    ("下京区", "京都"),
    ("東山区", "祇園四条"),
    ("三宮", "三宮"),
    ("元町", "元町"),
    ("西宮", "西宮北口"),
    ("芦屋", "芦屋"),
    ("奈良市", "近鉄奈良"),
    ("大津市", "大津"),
    ("草津市", "草津"),
    ("和歌山市", "和歌山"),
];
