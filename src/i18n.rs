//! User-facing texts for the supported locales

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            other => Err(format!("Unsupported locale: {}", other)),
        }
    }
}

impl Locale {
    pub fn greeting(&self, mention: &str) -> String {
        match self {
            Locale::En => format!(
                "Hello, {}! Welcome to the bot. Press «Get rate» to start.",
                mention
            ),
            Locale::Ru => format!(
                "Привет, {}! Добро пожаловать в бот. Нажмите кнопку «Узнать курс», чтобы начать.",
                mention
            ),
        }
    }

    pub fn rate_button_label(&self) -> &'static str {
        match self {
            Locale::En => "Get rate",
            Locale::Ru => "Узнать курс",
        }
    }

    pub fn currency_prompt(&self) -> &'static str {
        match self {
            Locale::En => "Enter a currency code (for example «RUB» - Russian ruble, «EUR» - Euro, «CNY» - Yuan, \
                «AED» - UAE dirham, «AMD» - Armenian dram, «GEL» - Georgian lari, «KZT» - Kazakhstani tenge, \
                «RSD» - Serbian dinar and others).",
            Locale::Ru => "Введите код валюты (например, «RUB» - Российский рубль, «EUR» - Евро, «CNY» - Юань, \
                «AED» - Дирхам (ОАЭ), «AMD» - Армянский драм, «GEL» - Грузинский лари, «KZT» - Казахстанский тенге, \
                «RSD» - Сербский динар и другие.)",
        }
    }

    pub fn rate_not_found(&self) -> &'static str {
        match self {
            Locale::En => "Rate not found",
            Locale::Ru => "Курс не найден",
        }
    }

    pub fn rate_usage(&self) -> &'static str {
        match self {
            Locale::En => "Usage: `$rate <CODE>`, for example `$rate EUR`",
            Locale::Ru => "Использование: `$rate <КОД>`, например `$rate EUR`",
        }
    }

    pub fn rates_unavailable(&self) -> &'static str {
        match self {
            Locale::En => "Exchange rates are unavailable right now. Please try again later.",
            Locale::Ru => "Курсы валют сейчас недоступны. Попробуйте позже.",
        }
    }

    pub fn rate_line(&self, date: &str, base: &str, rate: f64, code: &str) -> String {
        match self {
            Locale::En => format!("On {} 1 {} = {} {}", date, base, rate, code),
            Locale::Ru => format!("На {} 1 {} = {} {}", date, base, rate, code),
        }
    }
}
