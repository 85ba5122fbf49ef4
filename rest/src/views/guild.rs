use reqwest::Method;
use serde::Deserialize;

use accord_model::channel::Channel;
use accord_model::guild::{
    Ban,
    BanOptions,
    Guild,
    GuildEmbed,
    GuildMember,
    GuildPrune,
    Integration,
    Role,
};
use accord_model::invite::Invite;
use accord_model::message::Emoji;
use accord_model::voice::VoiceRegion;
use accord_model::Snowflake;

use crate::{Endpoint, Error, Result, RestClient};

#[derive(Deserialize)]
struct NickResponse {
    #[serde(default)]
    nick: String,
}

/// A view for interfacing with a Discord guild.
pub struct GuildView {
    id: Snowflake,
    client: RestClient,
}

impl GuildView {
    pub(crate) fn new(id: Snowflake, client: RestClient) -> Self {
        GuildView { id, client }
    }

    fn prefix(&self) -> String {
        format!("/guilds/{}", self.id)
    }

    fn members_bucket(&self) -> String {
        format!("{}/members", self.prefix())
    }

    fn bans_bucket(&self) -> String {
        format!("{}/bans", self.prefix())
    }

    fn roles_bucket(&self) -> String {
        format!("{}/roles", self.prefix())
    }

    /// Fetches the Guild object for this view's ID.
    pub async fn fetch(&self) -> Result<Guild> {
        self.client.request(Endpoint::new(Method::GET, self.prefix())).await
    }

    /// Fetches all channels in this guild.
    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/channels", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Gets the guild member with the given user ID.
    pub async fn get_member(&self, user: Snowflake) -> Result<GuildMember> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/members/{}", self.prefix(), user))
                    .bucket(self.members_bucket()),
            )
            .await
    }

    /// Lists guild members, paginated by the user ID to start after.
    pub async fn list_members(&self, limit: i32, after: Option<Snowflake>) -> Result<Vec<GuildMember>> {
        let mut endpt = Endpoint::new(Method::GET, format!("{}/members", self.prefix()))
            .bucket(self.members_bucket())
            .query("limit", limit);
        if let Some(after) = after {
            endpt = endpt.query("after", after);
        }
        self.client.request(endpt).await
    }

    /// Removes a member from this guild.
    pub async fn kick_member(&self, user: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::DELETE, format!("{}/members/{}", self.prefix(), user))
                    .bucket(self.members_bucket()),
            )
            .await
    }

    /// Adds a role to a guild member.
    pub async fn add_member_role(&self, user: Snowflake, role: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(
                    Method::PUT,
                    format!("{}/members/{}/roles/{}", self.prefix(), user, role),
                )
                .bucket(self.members_bucket()),
            )
            .await
    }

    /// Removes a role from a guild member.
    pub async fn remove_member_role(&self, user: Snowflake, role: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(
                    Method::DELETE,
                    format!("{}/members/{}/roles/{}", self.prefix(), user, role),
                )
                .bucket(self.members_bucket()),
            )
            .await
    }

    /// Changes the nickname of the current user, returning the new nickname.
    pub async fn change_nickname(&self, nick: &str) -> Result<String> {
        let json = serde_json::json!({ "nick": nick });
        let resp: NickResponse = self
            .client
            .request(
                Endpoint::new(Method::PATCH, format!("{}/members/@me/nick", self.prefix()))
                    .bucket(self.members_bucket())
                    .json(json),
            )
            .await?;
        Ok(resp.nick)
    }

    /// Gets the list of bans in this guild.
    pub async fn get_bans(&self) -> Result<Vec<Ban>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/bans", self.prefix()))
                    .bucket(self.bans_bucket()),
            )
            .await
    }

    /// Gets the ban for the provided user, if one exists.
    pub async fn get_ban(&self, user: Snowflake) -> Result<Ban> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/bans/{}", self.prefix(), user))
                    .bucket(self.bans_bucket()),
            )
            .await
    }

    /// Bans a user from this guild. Only supplied options become query parameters.
    pub async fn ban(&self, user: Snowflake, opts: BanOptions) -> Result<()> {
        let mut endpt = Endpoint::new(Method::PUT, format!("{}/bans/{}", self.prefix(), user))
            .bucket(self.bans_bucket());
        if let Some(days) = opts.delete_message_days {
            if !(0..=7).contains(&days) {
                return Err(Error::BadRequest(String::from(
                    "delete_message_days must lie between 0 and 7",
                )));
            }
            endpt = endpt.query("delete-message-days", days);
        }
        if let Some(reason) = opts.reason {
            endpt = endpt.query("reason", reason);
        }
        self.client.request(endpt).await
    }

    /// Removes the ban for the provided user.
    pub async fn unban(&self, user: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::DELETE, format!("{}/bans/{}", self.prefix(), user))
                    .bucket(self.bans_bucket()),
            )
            .await
    }

    /// Gets all roles in this guild.
    pub async fn get_roles(&self) -> Result<Vec<Role>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/roles", self.prefix()))
                    .bucket(self.roles_bucket()),
            )
            .await
    }

    /// Creates a role in this guild.
    pub async fn create_role(&self, role: Role) -> Result<Role> {
        self.client
            .request(
                Endpoint::new(Method::POST, format!("{}/roles", self.prefix()))
                    .bucket(self.roles_bucket())
                    .json(role),
            )
            .await
    }

    /// Modifies a role in this guild.
    pub async fn modify_role(&self, id: Snowflake, role: Role) -> Result<Role> {
        self.client
            .request(
                Endpoint::new(Method::PATCH, format!("{}/roles/{}", self.prefix(), id))
                    .bucket(self.roles_bucket())
                    .json(role),
            )
            .await
    }

    /// Deletes a role from this guild.
    pub async fn delete_role(&self, id: Snowflake) -> Result<()> {
        self.client
            .request(
                Endpoint::new(Method::DELETE, format!("{}/roles/{}", self.prefix(), id))
                    .bucket(self.roles_bucket()),
            )
            .await
    }

    /// Counts the members that a prune with the given threshold would remove.
    pub async fn get_prune_count(&self, days: i32) -> Result<GuildPrune> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/prune", self.prefix()))
                    .bucket(self.prefix())
                    .query("days", days),
            )
            .await
    }

    /// Begins pruning members inactive for the given number of days.
    ///
    /// Computing the pruned count is optional; large guilds skip it.
    pub async fn begin_prune(&self, days: i32, compute_prune_count: bool) -> Result<GuildPrune> {
        self.client
            .request(
                Endpoint::new(Method::POST, format!("{}/prune", self.prefix()))
                    .bucket(self.prefix())
                    .query("days", days)
                    .query("compute_prune_count", compute_prune_count),
            )
            .await
    }

    /// Gets all invites for this guild.
    pub async fn get_invites(&self) -> Result<Vec<Invite>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/invites", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Gets the voice regions available to this guild.
    pub async fn get_voice_regions(&self) -> Result<Vec<VoiceRegion>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/regions", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Gets this guild's embed settings.
    pub async fn get_embed(&self) -> Result<GuildEmbed> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/embed", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Modifies this guild's embed settings.
    pub async fn modify_embed(&self, embed: GuildEmbed) -> Result<GuildEmbed> {
        self.client
            .request(
                Endpoint::new(Method::PATCH, format!("{}/embed", self.prefix()))
                    .bucket(self.prefix())
                    .json(embed),
            )
            .await
    }

    /// Gets this guild's custom emojis.
    pub async fn get_emojis(&self) -> Result<Vec<Emoji>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/emojis", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }

    /// Gets this guild's integrations.
    pub async fn get_integrations(&self) -> Result<Vec<Integration>> {
        self.client
            .request(
                Endpoint::new(Method::GET, format!("{}/integrations", self.prefix()))
                    .bucket(self.prefix()),
            )
            .await
    }
}
