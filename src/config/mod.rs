//! Runtime configuration read from the environment.
//!
//! The whole snapshot is loaded once at startup and handed to the controller
//! by value; nothing here is re-read while the loop is running.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::models::Timeframe;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Deployment environment (`APP_ENV`), defaults to `sandbox`
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Position-sizing and exposure limits
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Fraction of equity committed per new order
    pub risk_fraction: f64,
    /// Stop-loss distance in multiples of the volatility measure
    pub stop_loss_factor: f64,
    /// Take-profit distance in multiples of the volatility measure
    pub take_profit_factor: f64,
    pub max_positions_per_direction: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 0.001,
            stop_loss_factor: 1.5,
            take_profit_factor: 3.0,
            max_positions_per_direction: 3,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return Err(ConfigError::Inconsistent(format!(
                "risk fraction must be in (0, 1], got {}",
                self.risk_fraction
            )));
        }
        if !(self.stop_loss_factor > 0.0) || !(self.take_profit_factor > 0.0) {
            return Err(ConfigError::Inconsistent(
                "stop-loss and take-profit factors must be positive".to_string(),
            ));
        }
        if self.max_positions_per_direction == 0 {
            return Err(ConfigError::Inconsistent(
                "max positions per direction must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Indicator windows and spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Number of bars needed before the most recent bar carries every
    /// indicator. RSI and ATR need one extra bar for the first delta; the
    /// MACD signal line needs a full signal span of MACD values.
    pub fn required_bars(&self) -> usize {
        [
            self.sma_short,
            self.sma_long,
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal.saturating_sub(1),
            self.atr_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("SMA_SHORT", self.sma_short),
            ("SMA_LONG", self.sma_long),
            ("RSI_PERIOD", self.rsi_period),
            ("MACD_FAST", self.macd_fast),
            ("MACD_SLOW", self.macd_slow),
            ("MACD_SIGNAL", self.macd_signal),
            ("ATR_PERIOD", self.atr_period),
        ];
        if let Some((key, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(ConfigError::Inconsistent(format!("{} must be at least 1", key)));
        }
        if self.sma_short >= self.sma_long {
            return Err(ConfigError::Inconsistent(format!(
                "short moving average window ({}) must be shorter than the long window ({})",
                self.sma_short, self.sma_long
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::Inconsistent(format!(
                "MACD fast span ({}) must be shorter than the slow span ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}

/// Oscillator thresholds used for vetoes and close conditions
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

/// In-memory broker used for dry runs
#[derive(Debug, Clone, PartialEq)]
pub struct PaperConfig {
    pub balance: f64,
    /// JSON array of candles replayed one bar per cycle
    pub candles_file: Option<PathBuf>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            candles_file: None,
        }
    }
}

/// Complete configuration snapshot for one run
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candle_count: usize,
    pub poll_interval: Duration,
    pub account_refresh: Duration,
    pub risk: RiskConfig,
    pub indicators: IndicatorConfig,
    pub signal: SignalConfig,
    pub telegram: Option<TelegramConfig>,
    pub paper: PaperConfig,
    /// Close every open position on the symbol once the loop has stopped
    pub close_all_on_shutdown: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "XAUUSDm".to_string(),
            timeframe: Timeframe::M15,
            candle_count: 100,
            poll_interval: Duration::from_secs(60),
            account_refresh: Duration::from_secs(1),
            risk: RiskConfig::default(),
            indicators: IndicatorConfig::default(),
            signal: SignalConfig::default(),
            telegram: None,
            paper: PaperConfig::default(),
            close_all_on_shutdown: false,
        }
    }
}

impl BotConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = BotConfig::default();

        let telegram = match (env::var("TELEGRAM_BOT_TOKEN"), env::var("TELEGRAM_CHAT_ID")) {
            (Ok(bot_token), Ok(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig {
                    api_url: env::var("TELEGRAM_API_URL")
                        .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),
                    bot_token,
                    chat_id,
                })
            }
            _ => None,
        };

        Ok(Self {
            symbol: env::var("SYMBOL").unwrap_or(defaults.symbol),
            timeframe: parse_var("TIMEFRAME", defaults.timeframe)?,
            candle_count: parse_var("CANDLE_COUNT", defaults.candle_count)?,
            poll_interval: Duration::from_secs(parse_var(
                "POLL_INTERVAL_SECONDS",
                defaults.poll_interval.as_secs(),
            )?),
            account_refresh: Duration::from_secs(parse_var(
                "ACCOUNT_REFRESH_SECONDS",
                defaults.account_refresh.as_secs(),
            )?),
            risk: RiskConfig {
                risk_fraction: parse_var("RISK_FRACTION", defaults.risk.risk_fraction)?,
                stop_loss_factor: parse_var("STOP_LOSS_ATR", defaults.risk.stop_loss_factor)?,
                take_profit_factor: parse_var(
                    "TAKE_PROFIT_ATR",
                    defaults.risk.take_profit_factor,
                )?,
                max_positions_per_direction: parse_var(
                    "MAX_POSITIONS",
                    defaults.risk.max_positions_per_direction,
                )?,
            },
            indicators: IndicatorConfig {
                sma_short: parse_var("SMA_SHORT", defaults.indicators.sma_short)?,
                sma_long: parse_var("SMA_LONG", defaults.indicators.sma_long)?,
                rsi_period: parse_var("RSI_PERIOD", defaults.indicators.rsi_period)?,
                macd_fast: parse_var("MACD_FAST", defaults.indicators.macd_fast)?,
                macd_slow: parse_var("MACD_SLOW", defaults.indicators.macd_slow)?,
                macd_signal: parse_var("MACD_SIGNAL", defaults.indicators.macd_signal)?,
                atr_period: parse_var("ATR_PERIOD", defaults.indicators.atr_period)?,
            },
            signal: SignalConfig {
                overbought: parse_var("RSI_OVERBOUGHT", defaults.signal.overbought)?,
                oversold: parse_var("RSI_OVERSOLD", defaults.signal.oversold)?,
            },
            telegram,
            paper: PaperConfig {
                balance: parse_var("PAPER_BALANCE", defaults.paper.balance)?,
                candles_file: env::var("PAPER_CANDLES_FILE")
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
            close_all_on_shutdown: parse_var(
                "CLOSE_ALL_ON_SHUTDOWN",
                defaults.close_all_on_shutdown,
            )?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Inconsistent("symbol must not be empty".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Inconsistent(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.account_refresh.is_zero() {
            return Err(ConfigError::Inconsistent(
                "account refresh interval must be greater than zero".to_string(),
            ));
        }
        self.risk.validate()?;
        self.indicators.validate()?;

        if self.candle_count < self.indicators.required_bars() {
            return Err(ConfigError::Inconsistent(format!(
                "candle count ({}) is below the {} bars the indicators need",
                self.candle_count,
                self.indicators.required_bars()
            )));
        }
        if !(self.signal.oversold < self.signal.overbought)
            || self.signal.oversold < 0.0
            || self.signal.overbought > 100.0
        {
            return Err(ConfigError::Inconsistent(format!(
                "oscillator thresholds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                self.signal.oversold, self.signal.overbought
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e: T::Err| {
            ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }
        }),
        _ => Ok(default),
    }
}
