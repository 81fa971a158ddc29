pub mod captions;
pub mod error;
pub mod media;

pub use captions::pick_template;
pub use error::{GraphError, Result};
pub use media::{MediaType, classify};

use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const ACCESS_TOKEN_KEY: &str = "access_token";

/// Connection settings for the Graph API, injected once at startup.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub page_id: String,
    pub access_token: String,
}

/// Client for Facebook Graph API page management. Every operation is a thin
/// wrapper that shapes parameters and forwards them through [`GraphClient::dispatch`].
pub struct GraphClient {
    client: Client,
    config: GraphConfig,
}

/// Outcome of a single item within a composite media operation.
#[derive(Debug, Serialize)]
pub struct MediaItemResult {
    pub media_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MediaItemResult {
    fn ok(media_url: &str, response: Value) -> Self {
        Self {
            media_url: media_url.to_string(),
            response: Some(response),
            error: None,
        }
    }

    fn failed(media_url: &str, error: &GraphError) -> Self {
        Self {
            media_url: media_url.to_string(),
            response: None,
            error: Some(error.to_string()),
        }
    }

    /// An item succeeded when it was dispatched and the remote envelope
    /// carries no `error` key.
    pub fn succeeded(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(|envelope| remote_error(envelope).is_none())
    }
}

/// Aggregate outcome of a best-effort batch operation. `success` is true iff
/// at least one item succeeded.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub results: Vec<MediaItemResult>,
}

impl BatchOutcome {
    fn from_results(results: Vec<MediaItemResult>) -> Self {
        Self {
            success: results.iter().any(MediaItemResult::succeeded),
            results,
        }
    }
}

/// Result of [`GraphClient::send_message_with_media`]: the text message
/// envelope plus per-attachment outcomes.
#[derive(Debug, Serialize)]
pub struct MediaMessageReceipt {
    pub text_message: Value,
    pub media_messages: Vec<MediaItemResult>,
    pub total_media_sent: usize,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    recipient: Recipient<'a>,
    message: MessageContent<'a>,
    messaging_type: &'static str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text { text: &'a str },
    Attachment { attachment: Attachment<'a> },
}

#[derive(Serialize)]
struct Attachment<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    payload: AttachmentPayload<'a>,
}

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    url: &'a str,
    is_reusable: bool,
}

impl<'a> MessagePayload<'a> {
    fn text(user_id: &'a str, text: &'a str) -> Self {
        Self {
            recipient: Recipient { id: user_id },
            message: MessageContent::Text { text },
            messaging_type: "RESPONSE",
        }
    }

    fn attachment(user_id: &'a str, media_type: MediaType, url: &'a str) -> Self {
        Self {
            recipient: Recipient { id: user_id },
            message: MessageContent::Attachment {
                attachment: Attachment {
                    kind: media_type.attachment_type(),
                    payload: AttachmentPayload {
                        url,
                        is_reusable: true,
                    },
                },
            },
            messaging_type: "RESPONSE",
        }
    }
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            config: GraphConfig { base_url, ..config },
        })
    }

    /// Issue a single Graph API request and return the JSON envelope
    /// verbatim, regardless of HTTP status. The configured access token is
    /// injected into the query, replacing any caller-supplied value.
    ///
    /// A non-JSON body fails with [`GraphError::MalformedResponse`]; a
    /// network failure with [`GraphError::Transport`]. An envelope carrying
    /// an `error` key is returned as data.
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.config.base_url, endpoint);

        let mut params: Vec<(&str, &str)> = query
            .iter()
            .filter(|(key, _)| *key != ACCESS_TOKEN_KEY)
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        params.push((ACCESS_TOKEN_KEY, &self.config.access_token));

        debug!(%method, endpoint, "dispatching Graph API request");

        let mut request = self.client.request(method, &url).query(&params);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let text = response.text().await?;
        let envelope: Value = serde_json::from_str(&text)?;

        Ok(envelope)
    }

    pub async fn post_message(&self, message: &str) -> Result<Value> {
        self.dispatch(
            Method::POST,
            &format!("{}/feed", self.config.page_id),
            &[("message", message.to_string())],
            None,
        )
        .await
    }

    pub async fn schedule_post(&self, message: &str, publish_time: i64) -> Result<Value> {
        self.dispatch(
            Method::POST,
            &format!("{}/feed", self.config.page_id),
            &[
                ("message", message.to_string()),
                ("published", "false".to_string()),
                ("scheduled_publish_time", publish_time.to_string()),
            ],
            None,
        )
        .await
    }

    pub async fn update_post(&self, post_id: &str, new_message: &str) -> Result<Value> {
        self.dispatch(
            Method::POST,
            post_id,
            &[("message", new_message.to_string())],
            None,
        )
        .await
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<Value> {
        self.dispatch(Method::DELETE, post_id, &[], None).await
    }

    pub async fn get_posts(&self) -> Result<Value> {
        self.dispatch(
            Method::GET,
            &format!("{}/posts", self.config.page_id),
            &[("fields", "id,message,created_time".to_string())],
            None,
        )
        .await
    }

    pub async fn get_comments(&self, post_id: &str) -> Result<Value> {
        self.dispatch(
            Method::GET,
            &format!("{post_id}/comments"),
            &[("fields", "id,message,from,created_time".to_string())],
            None,
        )
        .await
    }

    pub async fn reply_to_comment(&self, comment_id: &str, message: &str) -> Result<Value> {
        self.dispatch(
            Method::POST,
            &format!("{comment_id}/comments"),
            &[("message", message.to_string())],
            None,
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<Value> {
        self.dispatch(Method::DELETE, comment_id, &[], None).await
    }

    pub async fn hide_comment(&self, comment_id: &str) -> Result<Value> {
        self.set_comment_hidden(comment_id, true).await
    }

    pub async fn unhide_comment(&self, comment_id: &str) -> Result<Value> {
        self.set_comment_hidden(comment_id, false).await
    }

    async fn set_comment_hidden(&self, comment_id: &str, hidden: bool) -> Result<Value> {
        self.dispatch(
            Method::POST,
            comment_id,
            &[("is_hidden", hidden.to_string())],
            None,
        )
        .await
    }

    pub async fn get_insights(&self, post_id: &str, metric: &str, period: &str) -> Result<Value> {
        self.dispatch(
            Method::GET,
            &format!("{post_id}/insights"),
            &[
                ("metric", metric.to_string()),
                ("period", period.to_string()),
            ],
            None,
        )
        .await
    }

    pub async fn get_bulk_insights(
        &self,
        post_id: &str,
        metrics: &[String],
        period: &str,
    ) -> Result<Value> {
        self.get_insights(post_id, &metrics.join(","), period).await
    }

    pub async fn post_image(&self, image_url: &str, caption: &str) -> Result<Value> {
        self.dispatch(
            Method::POST,
            &format!("{}/photos", self.config.page_id),
            &[
                ("url", image_url.to_string()),
                ("caption", caption.to_string()),
            ],
            None,
        )
        .await
    }

    /// Post a single hosted video. The URL must classify as video; anything
    /// else fails before any request is issued.
    pub async fn post_video(&self, video_url: &str, description: &str) -> Result<Value> {
        if classify(video_url) != MediaType::Video {
            return Err(GraphError::UnsupportedMedia {
                url: video_url.to_string(),
            });
        }

        self.dispatch(
            Method::POST,
            &format!("{}/videos", self.config.page_id),
            &[
                ("file_url", video_url.to_string()),
                ("description", description.to_string()),
            ],
            None,
        )
        .await
    }

    pub async fn send_message(&self, user_id: &str, text: &str) -> Result<Value> {
        let payload = serde_json::to_value(MessagePayload::text(user_id, text))?;
        self.dispatch(Method::POST, "me/messages", &[], Some(&payload))
            .await
    }

    /// Send a text message followed by one attachment message per media URL,
    /// each shaped by the media classifier. The text message's failure
    /// propagates; attachment failures are recorded per item and later items
    /// are still attempted.
    pub async fn send_message_with_media(
        &self,
        user_id: &str,
        text: &str,
        media_urls: &[String],
    ) -> Result<MediaMessageReceipt> {
        let text_message = self.send_message(user_id, text).await?;

        let mut media_messages = Vec::with_capacity(media_urls.len());
        for media_url in media_urls {
            let media_type = classify(media_url);
            let payload = serde_json::to_value(MessagePayload::attachment(
                user_id, media_type, media_url,
            ))?;

            match self
                .dispatch(Method::POST, "me/messages", &[], Some(&payload))
                .await
            {
                Ok(response) => media_messages.push(MediaItemResult::ok(media_url, response)),
                Err(err) => {
                    warn!(%media_url, error = %err, "attachment message failed");
                    media_messages.push(MediaItemResult::failed(media_url, &err));
                }
            }
        }

        Ok(MediaMessageReceipt {
            text_message,
            total_media_sent: media_urls.len(),
            media_messages,
        })
    }

    /// Post a batch of hosted media to the page feed, best-effort. Images go
    /// to the photos edge, videos to the videos edge; anything else is
    /// recorded as a per-item error without a request.
    pub async fn post_media_batch(&self, media_urls: &[String], caption: &str) -> BatchOutcome {
        let mut results = Vec::with_capacity(media_urls.len());

        for media_url in media_urls {
            let outcome = match classify(media_url) {
                MediaType::Image => self.post_image(media_url, caption).await,
                MediaType::Video => self.post_video(media_url, caption).await,
                MediaType::File => Err(GraphError::UnsupportedMedia {
                    url: media_url.clone(),
                }),
            };

            match outcome {
                Ok(response) => results.push(MediaItemResult::ok(media_url, response)),
                Err(err) => {
                    warn!(%media_url, error = %err, "batch item failed");
                    results.push(MediaItemResult::failed(media_url, &err));
                }
            }
        }

        BatchOutcome::from_results(results)
    }

    /// Publish page stories from hosted media, best-effort. Each item is two
    /// sequential calls: an unpublished upload, then promotion of the
    /// returned id to the matching stories edge.
    pub async fn create_story(&self, media_urls: &[String]) -> BatchOutcome {
        let mut results = Vec::with_capacity(media_urls.len());

        for media_url in media_urls {
            let outcome = match classify(media_url) {
                MediaType::Image => {
                    self.publish_story_item(media_url, "photos", "url", "photo_stories", "photo_id")
                        .await
                }
                MediaType::Video => {
                    self.publish_story_item(
                        media_url,
                        "videos",
                        "file_url",
                        "video_stories",
                        "video_id",
                    )
                    .await
                }
                MediaType::File => Err(GraphError::UnsupportedMedia {
                    url: media_url.clone(),
                }),
            };

            match outcome {
                Ok(response) => results.push(MediaItemResult::ok(media_url, response)),
                Err(err) => {
                    warn!(%media_url, error = %err, "story item failed");
                    results.push(MediaItemResult::failed(media_url, &err));
                }
            }
        }

        BatchOutcome::from_results(results)
    }

    async fn publish_story_item(
        &self,
        media_url: &str,
        upload_edge: &str,
        url_key: &'static str,
        story_edge: &str,
        id_key: &'static str,
    ) -> Result<Value> {
        let upload = self
            .dispatch(
                Method::POST,
                &format!("{}/{upload_edge}", self.config.page_id),
                &[
                    (url_key, media_url.to_string()),
                    ("published", "false".to_string()),
                ],
                None,
            )
            .await?;

        let media_id = upload
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::MissingMediaId {
                url: media_url.to_string(),
            })?;

        self.dispatch(
            Method::POST,
            &format!("{}/{story_edge}", self.config.page_id),
            &[(id_key, media_id.to_string())],
            None,
        )
        .await
    }

    /// The page's fan count, or 0 when the field is absent.
    pub async fn page_fan_count(&self) -> Result<u64> {
        let envelope = self
            .dispatch(
                Method::GET,
                &self.config.page_id,
                &[("fields", "fan_count".to_string())],
                None,
            )
            .await?;
        Ok(fan_count_from(&envelope))
    }

    /// A post's share count, or 0 when `shares` or `shares.count` is absent.
    pub async fn post_share_count(&self, post_id: &str) -> Result<u64> {
        let envelope = self
            .dispatch(
                Method::GET,
                post_id,
                &[("fields", "shares".to_string())],
                None,
            )
            .await?;
        Ok(share_count_from(&envelope))
    }
}

/// The remote API signals failure with an `error` key in the envelope, not
/// via HTTP status. Returns that object when present.
pub fn remote_error(envelope: &Value) -> Option<&Value> {
    envelope.get("error")
}

pub fn fan_count_from(envelope: &Value) -> u64 {
    envelope
        .get("fan_count")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

pub fn share_count_from(envelope: &Value) -> u64 {
    envelope
        .get("shares")
        .and_then(|shares| shares.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fan_count_defaults_to_zero() {
        assert_eq!(fan_count_from(&json!({})), 0);
        assert_eq!(fan_count_from(&json!({"id": "1234"})), 0);
    }

    #[test]
    fn test_fan_count_present() {
        assert_eq!(fan_count_from(&json!({"fan_count": 250})), 250);
    }

    #[test]
    fn test_share_count_defaults_to_zero() {
        assert_eq!(share_count_from(&json!({})), 0);
        assert_eq!(share_count_from(&json!({"shares": {}})), 0);
    }

    #[test]
    fn test_share_count_present() {
        assert_eq!(share_count_from(&json!({"shares": {"count": 7}})), 7);
    }

    #[test]
    fn test_remote_error_detection() {
        let failure = json!({"error": {"message": "Invalid OAuth token", "code": 190}});
        assert!(remote_error(&failure).is_some());
        assert_eq!(remote_error(&failure).unwrap()["code"], 190);

        let success = json!({"id": "1234_5678"});
        assert!(remote_error(&success).is_none());
    }

    #[test]
    fn test_text_message_payload_shape() {
        let payload = serde_json::to_value(MessagePayload::text("42", "hello")).unwrap();
        assert_eq!(
            payload,
            json!({
                "recipient": {"id": "42"},
                "message": {"text": "hello"},
                "messaging_type": "RESPONSE",
            })
        );
    }

    #[test]
    fn test_attachment_payload_shape() {
        let payload = serde_json::to_value(MessagePayload::attachment(
            "42",
            MediaType::Video,
            "https://cdn.example.com/clip.mp4",
        ))
        .unwrap();
        assert_eq!(
            payload,
            json!({
                "recipient": {"id": "42"},
                "message": {
                    "attachment": {
                        "type": "video",
                        "payload": {
                            "url": "https://cdn.example.com/clip.mp4",
                            "is_reusable": true,
                        },
                    },
                },
                "messaging_type": "RESPONSE",
            })
        );
    }

    #[test]
    fn test_item_result_success_rules() {
        let ok = MediaItemResult::ok("a.jpg", json!({"id": "1"}));
        assert!(ok.succeeded());

        let remote_failure = MediaItemResult::ok("b.jpg", json!({"error": {"code": 100}}));
        assert!(!remote_failure.succeeded());

        let transport_failure = MediaItemResult::failed(
            "c.jpg",
            &GraphError::UnsupportedMedia {
                url: "c.jpg".to_string(),
            },
        );
        assert!(!transport_failure.succeeded());
    }

    #[test]
    fn test_batch_outcome_success_flag() {
        let mixed = BatchOutcome::from_results(vec![
            MediaItemResult::ok("a.jpg", json!({"id": "1"})),
            MediaItemResult::failed(
                "b.txt",
                &GraphError::UnsupportedMedia {
                    url: "b.txt".to_string(),
                },
            ),
        ]);
        assert!(mixed.success);

        let all_failed = BatchOutcome::from_results(vec![MediaItemResult::failed(
            "b.txt",
            &GraphError::UnsupportedMedia {
                url: "b.txt".to_string(),
            },
        )]);
        assert!(!all_failed.success);
    }
}
