//! Upcoming-events calendar, the stock app.
//!
//! Pulls the next few events from the calendar API and lists them under a
//! title band, with today's events inverted.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

use chrono::NaiveDateTime;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X13},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use serde::Deserialize;

use super::{DrawError, InkApp, UpdateError};
use crate::frame::FrameBuffer;
use crate::http::HttpClient;
use crate::secrets::ApiConfig;
use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

pub const APP_ID: &str = "calendar";

const CALENDAR_NAME: &str = "Personal";
const NUM_EVENTS: usize = 5;
const REFRESH_INTERVAL: Duration = Duration::from_secs(300 * 60);

const TITLE_HEIGHT: i32 = 75;
const DATE_BADGE_WIDTH: i32 = 187;
const ROW_SPACING: i32 = 70;
const ROW_BAND_HALF: i32 = 24;
const TEXT_LEFT: i32 = 16;
const MAX_ROW_CHARS: usize = 78;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEvent {
    /// `DD.Mon.HH:MM`, or `DD.Mon` for all-day events.
    #[serde(rename = "dateTime")]
    pub date_time: String,
    pub summary: String,
}

impl CalendarEvent {
    /// The `DD.Mon` part of `date_time`.
    fn day(&self) -> &str {
        match self.date_time.match_indices('.').nth(1) {
            Some((end, _)) => &self.date_time[..end],
            None => &self.date_time,
        }
    }
}

pub struct CalendarApp {
    api: ApiConfig,
    calendar: String,
    events: Option<Vec<CalendarEvent>>,
}

pub fn build(api: &ApiConfig) -> Box<dyn InkApp> {
    Box::new(CalendarApp::new(api.clone()))
}

impl CalendarApp {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            calendar: CALENDAR_NAME.to_string(),
            events: None,
        }
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/calendars/{}?num-events={}",
            self.api.base_url.trim_end_matches('/'),
            self.calendar,
            NUM_EVENTS
        )
    }

    pub fn events(&self) -> Option<&[CalendarEvent]> {
        self.events.as_deref()
    }

    fn render<D>(&self, target: &mut D, events: &[CalendarEvent], now: NaiveDateTime) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let width = DISPLAY_WIDTH as i32;
        let big_black = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let big_white = MonoTextStyle::new(&FONT_10X20, BinaryColor::Off);
        let small_black = MonoTextStyle::new(&FONT_6X13, BinaryColor::On);
        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();

        fill(target, Point::zero(), width, TITLE_HEIGHT, BinaryColor::On)?;
        Text::with_baseline(
            "Upcoming Events",
            Point::new(TEXT_LEFT, TITLE_HEIGHT / 2),
            big_white,
            Baseline::Middle,
        )
        .draw(target)?;

        // Date badge: white box inside the title band.
        let badge_left = width - DATE_BADGE_WIDTH;
        fill(
            target,
            Point::new(badge_left + 8, 8),
            DATE_BADGE_WIDTH - 16,
            TITLE_HEIGHT - 16,
            BinaryColor::Off,
        )?;
        let badge = now.format("%d %b").to_string();
        Text::with_text_style(
            &badge,
            Point::new(badge_left + DATE_BADGE_WIDTH / 2, TITLE_HEIGHT / 2),
            big_black,
            centered,
        )
        .draw(target)?;

        if events.is_empty() {
            Text::with_baseline(
                "No upcoming events",
                Point::new(TEXT_LEFT, TITLE_HEIGHT + ROW_SPACING),
                big_black,
                Baseline::Middle,
            )
            .draw(target)?;
        }

        let today = now.format("%d.%b").to_string();
        for (line, event) in events.iter().enumerate() {
            let y = TITLE_HEIGHT + ROW_SPACING * (line as i32 + 1);
            let row: String = format!("{} {}", event.date_time, event.summary)
                .chars()
                .take(MAX_ROW_CHARS)
                .collect();
            let style = if event.day() == today {
                fill(target, Point::new(0, y - ROW_BAND_HALF), width, 2 * ROW_BAND_HALF, BinaryColor::On)?;
                big_white
            } else {
                big_black
            };
            Text::with_baseline(&row, Point::new(TEXT_LEFT, y), style, Baseline::Middle).draw(target)?;
        }

        let footer = format!("Last updated: {}", now.format("%d %b, %H:%M"));
        Text::with_baseline(
            &footer,
            Point::new(TEXT_LEFT, DISPLAY_HEIGHT as i32 - 4),
            small_black,
            Baseline::Bottom,
        )
        .draw(target)?;
        Ok(())
    }
}

fn fill<D>(target: &mut D, top_left: Point, width: i32, height: i32, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(top_left, Size::new(width.max(0) as u32, height.max(0) as u32))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

impl InkApp for CalendarApp {
    fn update(&mut self, http: &mut dyn HttpClient) -> Result<(), UpdateError> {
        let url = self.request_url();
        log::info!("calendar: fetching {}", url);
        let headers = [
            (self.api.auth_header.as_str(), self.api.auth_key.as_str()),
            ("Content-Type", "application/json"),
        ];
        let response = http.get(&url, &headers)?;
        if response.status != 200 {
            return Err(UpdateError::Status(response.status));
        }
        let mut events: Vec<CalendarEvent> = serde_json::from_slice(&response.body)
            .map_err(|err| UpdateError::Parse(err.to_string()))?;
        events.truncate(NUM_EVENTS);
        log::info!("calendar: {} events", events.len());
        self.events = Some(events);
        Ok(())
    }

    fn draw(&self, frame: &mut FrameBuffer, now: NaiveDateTime) -> Result<(), DrawError> {
        let events = self.events.as_deref().ok_or(DrawError::NotUpdated)?;
        frame.clear();
        self.render(frame, events, now).map_err(|never| match never {})
    }

    fn refresh_interval(&self) -> Duration {
        REFRESH_INTERVAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FetchError, HttpResponse};
    use crate::mock::MockHttp;
    use chrono::NaiveDate;

    fn api() -> ApiConfig {
        ApiConfig {
            auth_header: "X-Api-Key".into(),
            auth_key: "k3y".into(),
            base_url: "https://cal.example.com/".into(),
        }
    }

    fn march_14() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        }
    }

    const EVENTS: &str = r#"[
        {"dateTime": "14.Mar.18:00", "summary": "Dentist"},
        {"dateTime": "15.Mar", "summary": "Hike"}
    ]"#;

    #[test]
    fn request_carries_auth_header() {
        let mut http = MockHttp::responding(Ok(ok("[]")));
        let mut app = CalendarApp::new(api());
        app.update(&mut http).unwrap();

        let request = &http.requests()[0];
        assert_eq!(request.url, "https://cal.example.com/calendars/Personal?num-events=5");
        assert!(request.has_header("X-Api-Key", "k3y"));
        assert!(request.has_header("Content-Type", "application/json"));
    }

    #[test]
    fn parses_events() {
        let mut http = MockHttp::responding(Ok(ok(EVENTS)));
        let mut app = CalendarApp::new(api());
        app.update(&mut http).unwrap();

        let events = app.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "Dentist");
        assert_eq!(events[0].day(), "14.Mar");
        assert_eq!(events[1].day(), "15.Mar");
    }

    #[test]
    fn non_200_is_status_error() {
        let mut http = MockHttp::responding(Ok(HttpResponse {
            status: 503,
            body: Vec::new(),
        }));
        let mut app = CalendarApp::new(api());
        assert_eq!(app.update(&mut http), Err(UpdateError::Status(503)));
        assert!(app.events().is_none());
    }

    #[test]
    fn non_array_body_is_parse_error() {
        let mut http = MockHttp::responding(Ok(ok(r#"{"error": "nope"}"#)));
        let mut app = CalendarApp::new(api());
        assert!(matches!(app.update(&mut http), Err(UpdateError::Parse(_))));
    }

    #[test]
    fn transport_error_is_fetch_error() {
        let mut http = MockHttp::responding(Err(FetchError::Transport("reset".into())));
        let mut app = CalendarApp::new(api());
        assert!(matches!(app.update(&mut http), Err(UpdateError::Fetch(_))));
    }

    #[test]
    fn draw_before_update_fails() {
        let app = CalendarApp::new(api());
        let mut frame = FrameBuffer::new();
        assert_eq!(app.draw(&mut frame, march_14()), Err(DrawError::NotUpdated));
        assert!(frame.is_blank());
    }

    #[test]
    fn todays_event_is_highlighted() {
        let mut http = MockHttp::responding(Ok(ok(EVENTS)));
        let mut app = CalendarApp::new(api());
        app.update(&mut http).unwrap();
        let mut frame = FrameBuffer::new();
        app.draw(&mut frame, march_14()).unwrap();

        let first_row = (TITLE_HEIGHT + ROW_SPACING) as u32;
        let second_row = (TITLE_HEIGHT + 2 * ROW_SPACING) as u32;
        assert_eq!(frame.pixel(790, first_row), BinaryColor::On);
        assert_eq!(frame.pixel(790, second_row), BinaryColor::Off);
        // Title band
        assert_eq!(frame.pixel(2, 2), BinaryColor::On);
    }

    #[test]
    fn empty_update_draws_placeholder() {
        let mut http = MockHttp::responding(Ok(ok("[]")));
        let mut app = CalendarApp::new(api());
        app.update(&mut http).unwrap();
        let mut frame = FrameBuffer::new();
        app.draw(&mut frame, march_14()).unwrap();

        let row = (TITLE_HEIGHT + ROW_SPACING) as u32;
        let ink = (0..DISPLAY_WIDTH).filter(|x| frame.pixel(*x, row) == BinaryColor::On).count();
        assert!(ink > 0);
    }

    #[test]
    fn only_five_events_are_kept() {
        let many: Vec<String> = (1..=8)
            .map(|d| format!(r#"{{"dateTime": "{:02}.Apr", "summary": "e{}"}}"#, d, d))
            .collect();
        let body = format!("[{}]", many.join(","));
        let mut http = MockHttp::responding(Ok(ok(&body)));
        let mut app = CalendarApp::new(api());
        app.update(&mut http).unwrap();
        assert_eq!(app.events().unwrap().len(), 5);
    }

    #[test]
    fn refresh_is_five_hours() {
        let app = CalendarApp::new(api());
        assert_eq!(app.refresh_interval(), Duration::from_secs(5 * 3600));
    }
}
