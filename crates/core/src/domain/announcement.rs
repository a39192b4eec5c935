// Announcement Script
//
// Fixed-template sentence calling a customer to the cashier. Plate digits are
// spelled one by one so speech engines do not read "1234" as a number.

use super::entry::QueueEntry;

/// Default shop name used in the closing phrase
pub const DEFAULT_SHOP_NAME: &str = "kaibete motor";

/// Voice languages to try, most preferred first
pub const DEFAULT_LANGUAGE_PREFERENCE: &[&str] =
    &["id-ID", "pt-PT", "pt-BR", "en-ID", "en-GB", "en-US"];

/// Spell every ASCII digit as an Indonesian word followed by a space
pub fn spell_digits(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 4);
    for c in s.chars() {
        let word = match c {
            '0' => "nol",
            '1' => "satu",
            '2' => "dua",
            '3' => "tiga",
            '4' => "empat",
            '5' => "lima",
            '6' => "enam",
            '7' => "tujuh",
            '8' => "delapan",
            '9' => "sembilan",
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(word);
        out.push(' ');
    }
    out
}

/// Sentence plus speech parameters handed to an `Announcer`
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementScript {
    pub sentence: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language_preference: Vec<String>,
}

impl AnnouncementScript {
    pub fn for_entry(entry: &QueueEntry, shop_name: &str) -> Self {
        let sentence = format!(
            "Panggilan kepada pemilik motor atas nama {}, dengan motor {}, dengan nomor polisi {}, \
             silahkan melakukan pembayaran ke kasir, terima kasih telah melakukan servis motor di {}.",
            entry.customer.trim(),
            entry.motor.trim(),
            spell_digits(entry.nopol.trim()),
            shop_name,
        );

        Self {
            sentence,
            rate: 0.95,
            pitch: 1.0,
            volume: 1.0,
            language_preference: DEFAULT_LANGUAGE_PREFERENCE
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
