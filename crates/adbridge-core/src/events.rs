// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed ad-lifecycle events published on the event bus.
//
// Every event is tagged with the instance identifier it concerns and an
// `EventKind` (format + event type).  Kinds have stable wire names that match
// the scripting-side event API, e.g. `onBannerLoaded` or `onRewardEarned`.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::types::{AdFormat, AdId, AdInfo, NativeError};

/// What happened to an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdEventType {
    Loaded,
    FailedToLoad,
    Shown,
    FailedToShow,
    Clicked,
    /// Inline view hidden by the caller.
    Hidden,
    /// Fullscreen ad dismissed.
    Closed,
    Impression,
    RevenuePaid,
    /// Rewarded only.
    RewardEarned,
    /// Inline view expanded to fullscreen after a click.
    Expanded,
    Collapsed,
}

impl AdEventType {
    fn wire_suffix(&self) -> &'static str {
        match self {
            Self::Loaded => "Loaded",
            Self::FailedToLoad => "FailedToLoad",
            Self::Shown => "Shown",
            Self::FailedToShow => "FailedToShow",
            Self::Clicked => "Clicked",
            Self::Hidden => "Hidden",
            Self::Closed => "Closed",
            Self::Impression => "Impression",
            Self::RevenuePaid => "RevenuePaid",
            Self::RewardEarned => "RewardEarned",
            Self::Expanded => "Expanded",
            Self::Collapsed => "Collapsed",
        }
    }

    /// Whether an ad of `format` can ever produce this event.
    pub fn applies_to(&self, format: AdFormat) -> bool {
        match self {
            Self::Hidden | Self::Expanded | Self::Collapsed => format.is_view(),
            Self::Closed => format.is_fullscreen(),
            Self::RewardEarned => format == AdFormat::Rewarded,
            _ => true,
        }
    }

    const ALL: [AdEventType; 12] = [
        Self::Loaded,
        Self::FailedToLoad,
        Self::Shown,
        Self::FailedToShow,
        Self::Clicked,
        Self::Hidden,
        Self::Closed,
        Self::Impression,
        Self::RevenuePaid,
        Self::RewardEarned,
        Self::Expanded,
        Self::Collapsed,
    ];
}

/// Subscription key: one event type of one ad format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind {
    pub format: AdFormat,
    pub event: AdEventType,
}

impl EventKind {
    pub const fn new(format: AdFormat, event: AdEventType) -> Self {
        Self { format, event }
    }

    /// Every kind an ad of `format` can publish.
    pub fn all_for(format: AdFormat) -> Vec<EventKind> {
        AdEventType::ALL
            .iter()
            .filter(|event| event.applies_to(format))
            .map(|event| Self::new(format, *event))
            .collect()
    }

    /// Every kind across all formats.
    pub fn all() -> Vec<EventKind> {
        AdFormat::ALL.iter().flat_map(|f| Self::all_for(*f)).collect()
    }

    /// Scripting-side event name.
    pub fn wire_name(&self) -> String {
        match self.event {
            AdEventType::RewardEarned => "onRewardEarned".to_owned(),
            event => format!("on{}{}", self.format.wire_prefix(), event.wire_suffix()),
        }
    }

    /// Inverse of [`wire_name`](Self::wire_name).
    ///
    /// `onRewardEarned` resolves to the rewarded format, the only one that
    /// can earn a reward.
    pub fn from_wire_name(name: &str) -> Option<EventKind> {
        Self::all().into_iter().find(|kind| kind.wire_name() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire_name())
    }
}

/// Format-specific event body.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Ad metadata from the native callback.
    Ad(AdInfo),
    /// Native error (load or display failure).
    Error(NativeError),
    /// Bridge-originated events (e.g. `Hidden`) carry no native data.
    Empty,
}

/// A single ad-lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct AdEvent {
    pub kind: EventKind,
    pub ad_id: AdId,
    pub payload: EventPayload,
    /// When the bridge received the underlying callback.
    pub timestamp: DateTime<Utc>,
}

impl AdEvent {
    pub fn new(kind: EventKind, ad_id: AdId, payload: EventPayload) -> Self {
        Self {
            kind,
            ad_id,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn ad_info(&self) -> Option<&AdInfo> {
        match &self.payload {
            EventPayload::Ad(info) => Some(info),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&NativeError> {
        match &self.payload {
            EventPayload::Error(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    event: String,
    ad_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ad: Option<&'a AdInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'a str>,
    timestamp: DateTime<Utc>,
}

impl Serialize for AdEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let err = self.error();
        WireEvent {
            event: self.kind.wire_name(),
            ad_id: self.ad_id.as_str(),
            ad: self.ad_info(),
            error: err.map(|e| e.message.as_str()),
            error_code: err.map(|e| e.code.as_str()),
            timestamp: self.timestamp,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_follow_scripting_api() {
        let loaded = EventKind::new(AdFormat::Interstitial, AdEventType::Loaded);
        assert_eq!(loaded.wire_name(), "onInterstitialLoaded");

        let failed = EventKind::new(AdFormat::Banner, AdEventType::FailedToLoad);
        assert_eq!(failed.wire_name(), "onBannerFailedToLoad");

        let mrec = EventKind::new(AdFormat::Mrec, AdEventType::RevenuePaid);
        assert_eq!(mrec.wire_name(), "onMRECRevenuePaid");

        let reward = EventKind::new(AdFormat::Rewarded, AdEventType::RewardEarned);
        assert_eq!(reward.wire_name(), "onRewardEarned");
    }

    #[test]
    fn kinds_are_restricted_per_format() {
        let banner = EventKind::all_for(AdFormat::Banner);
        assert!(banner.contains(&EventKind::new(AdFormat::Banner, AdEventType::Hidden)));
        assert!(!banner.contains(&EventKind::new(AdFormat::Banner, AdEventType::Closed)));

        let interstitial = EventKind::all_for(AdFormat::Interstitial);
        assert!(!interstitial
            .iter()
            .any(|k| k.event == AdEventType::RewardEarned || k.event == AdEventType::Hidden));

        let rewarded = EventKind::all_for(AdFormat::Rewarded);
        assert_eq!(rewarded.len(), 9);
    }

    #[test]
    fn error_event_serializes_flat() {
        let event = AdEvent::new(
            EventKind::new(AdFormat::Rewarded, AdEventType::FailedToLoad),
            AdId::from("r1"),
            EventPayload::Error(NativeError::new("NO_FILL", "no ad available")),
        );
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "onRewardedFailedToLoad");
        assert_eq!(json["adId"], "r1");
        assert_eq!(json["error"], "no ad available");
        assert_eq!(json["errorCode"], "NO_FILL");
        assert!(json.get("ad").is_none());
    }

    #[test]
    fn ad_event_serializes_metadata() {
        let event = AdEvent::new(
            EventKind::new(AdFormat::Banner, AdEventType::Loaded),
            AdId::from("b1"),
            EventPayload::Ad(AdInfo {
                bidder_name: "meta".into(),
                ..Default::default()
            }),
        );
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["ad"]["bidderName"], "meta");
        assert_eq!(json["ad"]["revenue"], 0.0);
        assert!(json.get("errorCode").is_none());
    }

    #[test]
    fn wire_names_parse_back() {
        for kind in EventKind::all() {
            assert_eq!(EventKind::from_wire_name(&kind.wire_name()), Some(kind));
        }
        assert_eq!(
            EventKind::from_wire_name("onRewardEarned"),
            Some(EventKind::new(AdFormat::Rewarded, AdEventType::RewardEarned))
        );
        assert_eq!(EventKind::from_wire_name("onBannerClosed"), None);
    }
}
