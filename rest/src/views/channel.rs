use reqwest::Method;

use accord_model::channel::{Channel, GetMessagesOptions, ModifyChannelOptions};
use accord_model::invite::{CreateInviteOptions, Invite};
use accord_model::message::{CreateMessageOptions, Message};
use accord_model::{Snowflake, User};

use crate::views::encode_segment;
use crate::{Endpoint, Error, Result, RestClient};

/// A view for interfacing with a Discord channel.
///
/// Operations compose their route from the channel prefix and pick the
/// rate-limit bucket the server actually groups them under: the prefix for
/// channel-level calls, `/messages` for message calls, and the dedicated
/// `/messages/reactions` bucket for reaction calls.
pub struct ChannelView {
    id: Snowflake,
    client: RestClient,
}

impl ChannelView {
    pub(crate) fn new(id: Snowflake, client: RestClient) -> Self {
        ChannelView { id, client }
    }

    fn prefix(&self) -> String {
        format!("/channels/{}", self.id)
    }

    fn messages_bucket(&self) -> String {
        format!("{}/messages", self.prefix())
    }

    fn reactions_bucket(&self) -> String {
        format!("{}/messages/reactions", self.prefix())
    }

    /// Fetches the Channel object for this view's ID.
    pub async fn fetch(&self) -> Result<Channel> {
        self.client.request(Endpoint::new(Method::GET, self.prefix())).await
    }

    /// Modifies this channel.
    pub async fn modify(&self, opts: ModifyChannelOptions) -> Result<Channel> {
        self.client
            .request(Endpoint::new(Method::PATCH, self.prefix()).json(opts))
            .await
    }

    /// Deletes this channel, or closes it in the case of a DM.
    pub async fn delete(&self) -> Result<Channel> {
        self.client.request(Endpoint::new(Method::DELETE, self.prefix())).await
    }

    /// Fetches a page of messages in this channel.
    ///
    /// The limit must lie in `[1, 100]` and at most one of around, before
    /// and after may be supplied.
    pub async fn get_messages(&self, opts: GetMessagesOptions) -> Result<Vec<Message>> {
        if let Some(limit) = opts.limit {
            if !(1..=100).contains(&limit) {
                return Err(Error::BadRequest(String::from(
                    "message limit must lie between 1 and 100",
                )));
            }
        }
        if opts.anchors() > 1 {
            return Err(Error::BadRequest(String::from(
                "at most one of around, before and after may be supplied",
            )));
        }

        let mut endpt = Endpoint::new(Method::GET, format!("{}/messages", self.prefix()))
            .bucket(self.messages_bucket());
        if let Some(limit) = opts.limit {
            endpt = endpt.query("limit", limit);
        }
        if let Some(around) = opts.around {
            endpt = endpt.query("around", around);
        }
        if let Some(before) = opts.before {
            endpt = endpt.query("before", before);
        }
        if let Some(after) = opts.after {
            endpt = endpt.query("after", after);
        }
        self.client.request(endpt).await
    }

    /// Gets a single message in this channel, by ID.
    pub async fn get_message(&self, mid: Snowflake) -> Result<Message> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/messages/{}", self.prefix(), mid))
                    .bucket(self.messages_bucket()),
            )
            .await
    }

    /// Creates a message in this channel.
    pub async fn create_message(&self, opts: CreateMessageOptions) -> Result<Message> {
        self.client
            .request(
                Endpoint::new(Method::POST, format!("{}/messages", self.prefix()))
                    .bucket(self.messages_bucket())
                    .json(opts),
            )
            .await
    }

    /// Edits a message in this channel.
    pub async fn edit_message(&self, mid: Snowflake, opts: CreateMessageOptions) -> Result<Message> {
        self.client
            .request(
                Endpoint::new(Method::PATCH, format!("{}/messages/{}", self.prefix(), mid))
                    .bucket(self.messages_bucket())
                    .json(opts),
            )
            .await
    }

    /// Deletes a single message from this channel.
    pub async fn delete_message(&self, mid: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::DELETE, format!("{}/messages/{}", self.prefix(), mid))
                    .bucket(self.messages_bucket()),
            )
            .await
    }

    /// Deletes between one and one hundred messages in one call.
    ///
    /// A single ID routes to the single-message endpoint rather than the
    /// bulk endpoint, which the API rejects for one message.
    pub async fn delete_messages(&self, ids: Vec<Snowflake>) -> Result<()> {
        match ids.len() {
            0 => Err(Error::BadRequest(String::from("no message IDs supplied"))),
            1 => self.delete_message(ids[0]).await,
            2..=100 => {
                let json = serde_json::json!({ "messages": ids });
                self.client
                    .request(
                        Endpoint::new(
                            Method::POST,
                            format!("{}/messages/bulk-delete", self.prefix()),
                        )
                        .bucket(self.messages_bucket())
                        .json(json),
                    )
                    .await
            }
            _ => Err(Error::BadRequest(String::from(
                "at most 100 messages may be deleted per call",
            ))),
        }
    }

    /// Creates an invite for this channel.
    pub async fn create_invite(&self, opts: CreateInviteOptions) -> Result<Invite> {
        self.client
            .request(
                Endpoint::new(Method::POST, format!("{}/invites", self.prefix()))
                    .bucket(self.prefix())
                    .json(opts),
            )
            .await
    }

    /// Gets all invites created for this channel.
    pub async fn get_invites(&self) -> Result<Vec<Invite>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/invites", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Fires the typing indicator in this channel.
    pub async fn trigger_typing(&self) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::POST, format!("{}/typing", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Gets all pinned messages in this channel.
    pub async fn get_pins(&self) -> Result<Vec<Message>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/pins", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Pins a message in this channel.
    pub async fn pin_message(&self, mid: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::PUT, format!("{}/pins/{}", self.prefix(), mid))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Removes a pinned message from this channel.
    pub async fn unpin_message(&self, mid: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::DELETE, format!("{}/pins/{}", self.prefix(), mid))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Adds a reaction to a message on behalf of the current user.
    pub async fn create_reaction(&self, mid: Snowflake, emoji: &str) -> Result<()> {
        self.client
            .request(
                Endpoint::new(
                    Method::PUT,
                    format!(
                        "{}/messages/{}/reactions/{}/@me",
                        self.prefix(),
                        mid,
                        encode_segment(emoji)
                    ),
                )
                .bucket(self.reactions_bucket()),
            )
            .await
    }

    /// Removes a user's reaction from a message; the current user if `None`.
    pub async fn delete_reaction(
        &self,
        mid: Snowflake,
        emoji: &str,
        user: Option<Snowflake>,
    ) -> Result<()> {
        let target = match user {
            Some(id) => id.to_string(),
            None => String::from("@me"),
        };
        self.client
            .request(
                Endpoint::new(
                    Method::DELETE,
                    format!(
                        "{}/messages/{}/reactions/{}/{}",
                        self.prefix(),
                        mid,
                        encode_segment(emoji),
                        target
                    ),
                )
                .bucket(self.reactions_bucket()),
            )
            .await
    }

    /// Lists the users who reacted to a message with the given emoji.
    pub async fn get_reactions(&self, mid: Snowflake, emoji: &str) -> Result<Vec<User>> {
        self.client
            .request(
                Endpoint::new(
                    Method::GET,
                    format!(
                        "{}/messages/{}/reactions/{}",
                        self.prefix(),
                        mid,
                        encode_segment(emoji)
                    ),
                )
                .bucket(self.reactions_bucket()),
            )
            .await
    }

    /// Removes every reaction from a message.
    pub async fn delete_all_reactions(&self, mid: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(
                    Method::DELETE,
                    format!("{}/messages/{}/reactions", self.prefix(), mid),
                )
                .bucket(self.reactions_bucket()),
            )
            .await
    }
}
