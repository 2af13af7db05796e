// ============================================================
// MUNICIPALITY FILE INFRASTRUCTURE
// ============================================================
// Encoding detection, format sniffing, and line parsing for CSV/TXT imports

mod encoding_detector;
mod format_sniffer;
mod line_parser;
mod line_reader;

pub use encoding_detector::EncodingDetector;
pub use format_sniffer::FormatSniffer;
pub use line_parser::LineParser;
pub use line_reader::physical_lines;
