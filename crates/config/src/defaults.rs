// Defaults and constants for boardmark configuration

// Scan periods (milliseconds)
pub(crate) const IMAGE_SCAN_MS: u64 = 2000;
pub(crate) const MEME_SCAN_MS: u64 = 2000;
pub(crate) const URL_SCAN_MS: u64 = 2000;
pub(crate) const TIME_SCAN_MS: u64 = 1000;
pub(crate) const MOVE_POLL_MS: u64 = 500;
pub(crate) const DEDUP_CLEAR_SECS: u64 = 60 * 60;

// Time requests
pub(crate) const MAX_SECONDS: u64 = 300;
/// The host grants time in fixed steps.
pub(crate) const TIME_INCREMENT: u64 = 15;
pub(crate) const CLICK_DELAY_MS: u64 = 150;
pub(crate) const FEEDBACK_MS: u64 = 1000;

// Host hooks
pub(crate) const CHAT_CONTAINER_CLASS: &str = "mchat__messages";
pub(crate) const IMAGE_MARK: &str = "imageInlined";
pub(crate) const MEME_MARK: &str = "memeConverted";
pub(crate) const URL_MARK: &str = "urlLinked";
pub(crate) const DEDUP_STORAGE_KEY: &str = "lichessTimeRequestsProcessed";
pub(crate) const PREFERENCES_STORAGE_KEY: &str = "lila-preferences";

// Style
pub(crate) const HISTORY_LIMIT: usize = 100;
pub(crate) const DEFAULT_PIECE_SET: &str = "cburnett";
pub(crate) const DEFAULT_BOARD_THEME: &str = "brown";

pub(crate) const PIECE_SETS: &[&str] = &[
    "cburnett",
    "merida",
    "alpha",
    "pirouetti",
    "chessnut",
    "chess7",
    "reillycraig",
    "fantasy",
    "spatial",
    "california",
    "pixel",
    "maestro",
    "fresca",
    "cardinal",
    "gioco",
    "tatiana",
    "staunty",
    "governor",
    "dubrovny",
    "icpieces",
    "shapes",
    "letter",
];

pub(crate) const BOARD_THEMES: &[&str] = &[
    "blue",
    "blue2",
    "blue3",
    "blue-marble",
    "canvas",
    "wood",
    "wood2",
    "wood3",
    "wood4",
    "maple",
    "maple2",
    "brown",
    "leather",
    "green",
    "marble",
    "green-plastic",
    "grey",
    "metal",
    "olive",
    "newspaper",
    "purple",
    "purple-diag",
    "pink",
    "ic",
    "horsey",
];

pub(crate) const MEMES: &[(&str, &str)] = &[
    (
        "pikachu",
        "https://i.kym-cdn.com/entries/icons/mobile/000/027/475/Screen_Shot_2018-10-25_at_11.02.15_AM.jpg",
    ),
    ("elmo", "https://media.tenor.com/jDYNnTW0v9gAAAAM/hellfire.gif"),
    (
        "doge",
        "https://upload.wikimedia.org/wikipedia/en/5/5f/Original_Doge_meme.jpg",
    ),
    (
        "notsureif",
        "https://media0.giphy.com/media/ANbD1CCdA3iI8/200w.gif?cid=6c09b9522tdf89y6y61he7b38pr74sunmv6d7flqyju1a5b3&ep=v1_gifs_search&rid=200w.gif&ct=g",
    ),
];
