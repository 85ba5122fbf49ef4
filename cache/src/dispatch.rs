//! Maps gateway dispatch events onto cache mutations.

use serde_json::Value;

use accord_model::{
    channel::Channel,
    gateway::{GatewayEvent, ReadyPacket},
    guild::{
        Guild,
        GuildEmojisUpdate,
        GuildMember,
        GuildMemberRemove,
        GuildMembersChunk,
        GuildMemberUpdate,
        GuildRoleDelete,
        GuildRoleEvent,
    },
    message::{
        Emoji,
        Message,
        MessageDelete,
        MessageDeleteBulk,
        MessageReactionEvent,
        MessageReactionRemoveAll,
        Reaction,
        TypingStart,
    },
    presence::PresenceUpdate,
    voice::VoiceState,
    Snowflake,
    User,
};

use crate::{CacheClient, Error, GuildUserEntry, ReadySnapshot, Record};

/// Applies a dispatch event to the cache.
///
/// Malformed payloads and misses are logged and ignored; dispatch never
/// fails the receive loop.
pub fn apply(cache: &CacheClient, event: GatewayEvent, data: &Value) {
    if let Err(err) = run(cache, event, data) {
        warn!("Failed to apply {} to the cache: {}", event, err);
    }
}

fn run(cache: &CacheClient, event: GatewayEvent, data: &Value) -> Result<(), serde_json::Error> {
    use GatewayEvent::*;

    match event {
        READY => {
            let ready: ReadyPacket = payload(data)?;
            *cache.ready.lock() = Some(ReadySnapshot::from_packet(&ready));
        }
        RESUMED => {}
        CHANNEL_CREATE => {
            let channel: Channel = payload(data)?;
            if cache.channels.put(channel.clone()).is_err() {
                let _ = cache.channels.patch(channel, true);
            }
        }
        CHANNEL_UPDATE => {
            let channel: Channel = payload(data)?;
            if let Err(Error::NotFound) = cache.channels.patch(channel, false) {
                debug!("CHANNEL_UPDATE for a channel that was never cached");
            }
        }
        CHANNEL_DELETE => {
            let channel: Channel = payload(data)?;
            cache.channels.remove(&channel.id);
        }
        GUILD_CREATE => {
            let guild: Guild = payload(data)?;
            store_guild(cache, guild);
        }
        GUILD_UPDATE => {
            let guild: Guild = payload(data)?;
            if let Err(Error::NotFound) = cache.guilds.patch(guild, false) {
                debug!("GUILD_UPDATE for a guild that was never cached");
            }
        }
        GUILD_DELETE => {
            let stub: Guild = payload(data)?;
            if cache.guilds.update(stub.id, |g| g.unavailable = true, false).is_err() {
                debug!("GUILD_DELETE for a guild that was never cached");
            }
        }
        GUILD_EMOJIS_UPDATE => {
            let update: GuildEmojisUpdate = payload(data)?;
            let emojis = update.emojis;
            let _ = cache.guilds.update(update.guild_id, move |g| g.emojis = emojis, false);
        }
        GUILD_MEMBER_ADD => {
            let member: GuildMember = payload(data)?;
            let guild_id = member.guild_id.unwrap_or_default();
            store_member(cache, guild_id, &member);
        }
        GUILD_MEMBER_REMOVE => {
            let removal: GuildMemberRemove = payload(data)?;
            cache.guild_users.remove(&(removal.guild_id, removal.user.id));
        }
        GUILD_MEMBER_UPDATE => {
            let update: GuildMemberUpdate = payload(data)?;
            let key = (update.guild_id, update.user.id);
            let result = cache.guild_users.update(
                key,
                |entry| {
                    entry.roles = update.roles.clone();
                    entry.nickname = update.nick.clone();
                },
                false,
            );
            if result.is_err() {
                debug!("GUILD_MEMBER_UPDATE for an unknown member");
            }
        }
        GUILD_MEMBERS_CHUNK => {
            let chunk: GuildMembersChunk = payload(data)?;
            for member in &chunk.members {
                store_member(cache, chunk.guild_id, member);
            }
        }
        GUILD_ROLE_CREATE => {
            let event: GuildRoleEvent = payload(data)?;
            let role = event.role;
            let _ = cache.guilds.update(event.guild_id, move |g| g.roles.push(role), false);
        }
        GUILD_ROLE_UPDATE => {
            let event: GuildRoleEvent = payload(data)?;
            let role = event.role;
            let _ = cache.guilds.update(
                event.guild_id,
                move |g| match g.roles.iter_mut().find(|r| r.id == role.id) {
                    Some(existing) => *existing = role,
                    None => g.roles.push(role),
                },
                false,
            );
        }
        GUILD_ROLE_DELETE => {
            let event: GuildRoleDelete = payload(data)?;
            let _ = cache.guilds.update(
                event.guild_id,
                |g| g.roles.retain(|r| r.id != event.role_id),
                false,
            );
        }
        MESSAGE_CREATE => {
            let message: Message = payload(data)?;
            if cache.messages.put(message).is_err() {
                debug!("MESSAGE_CREATE for a message that is already cached");
            }
        }
        MESSAGE_UPDATE => {
            let message: Message = payload(data)?;
            if let Err(Error::NotFound) = cache.messages.patch(message, false) {
                debug!("MESSAGE_UPDATE for a message that was never cached");
            }
        }
        MESSAGE_DELETE => {
            let deletion: MessageDelete = payload(data)?;
            if !cache.messages.remove(&deletion.id) {
                debug!("MESSAGE_DELETE for a message that was never cached");
            }
        }
        MESSAGE_DELETE_BULK => {
            let deletion: MessageDeleteBulk = payload(data)?;
            let missing = cache.messages.remove_all(&deletion.ids);
            if !missing.is_empty() {
                debug!("MESSAGE_DELETE_BULK skipped {} uncached messages", missing.len());
            }
        }
        MESSAGE_REACTION_ADD => {
            let event: MessageReactionEvent = payload(data)?;
            let _ = cache.messages.update(
                event.message_id,
                |m| add_reaction(m, &event.emoji, event.user_id),
                false,
            );
        }
        MESSAGE_REACTION_REMOVE => {
            let event: MessageReactionEvent = payload(data)?;
            let _ = cache.messages.update(
                event.message_id,
                |m| remove_reaction(m, &event.emoji, event.user_id),
                false,
            );
        }
        MESSAGE_REACTION_REMOVE_ALL => {
            let event: MessageReactionRemoveAll = payload(data)?;
            let _ = cache.messages.update(event.message_id, |m| m.reactions.clear(), false);
        }
        PRESENCE_UPDATE => {
            let presence: PresenceUpdate = payload(data)?;
            let guild_id = presence.guild_id.unwrap_or_default();
            let key = (guild_id, presence.user.id);
            let _ = cache.guild_users.update(
                key,
                |entry| {
                    entry.status = presence.status;
                    entry.game = presence.game.clone();
                    if !presence.roles.is_empty() {
                        entry.roles = presence.roles.clone();
                    }
                },
                true,
            );
        }
        TYPING_START => {
            let typing: TypingStart = payload(data)?;
            let key = (typing.channel_id, typing.user_id);
            let _ = cache.channel_users.update(
                key,
                |entry| entry.last_typing = Some(typing.timestamp),
                true,
            );
        }
        USER_UPDATE => {
            let user: User = payload(data)?;
            let _ = cache.users.patch(user, true);
        }
        VOICE_STATE_UPDATE => {
            let state: VoiceState = payload(data)?;
            let key = state.key();
            let _ = cache.voice_states.update(key, |entry| *entry = state.clone(), true);
        }
        other => {
            debug!("Ignoring {} dispatch", other);
        }
    }

    Ok(())
}

fn payload<T: serde::de::DeserializeOwned>(data: &Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data.clone())
}

// GUILD_CREATE fans out into the channel, member and user stores before the
// guild itself is cached; the embedded collections live in their own stores.
fn store_guild(cache: &CacheClient, mut guild: Guild) {
    for mut channel in guild.channels.drain(..) {
        channel.guild_id = Some(guild.id);
        if cache.channels.put(channel.clone()).is_err() {
            let _ = cache.channels.patch(channel, true);
        }
    }

    let members = std::mem::take(&mut guild.members);
    for member in &members {
        store_member(cache, guild.id, member);
    }

    guild.presences.clear();
    guild.voice_states.clear();

    if cache.guilds.put(guild.clone()).is_err() {
        let _ = cache.guilds.patch(guild, true);
    }
}

fn store_member(cache: &CacheClient, guild_id: Snowflake, member: &GuildMember) {
    let entry = GuildUserEntry::from_member(guild_id, member);
    let key = entry.key();
    if cache.guild_users.put(entry.clone()).is_err() {
        let _ = cache.guild_users.update(key, move |existing| *existing = entry, false);
    }
    if let Some(user) = &member.user {
        let _ = cache.users.patch(user.clone(), true);
    }
}

fn add_reaction(message: &mut Message, emoji: &Emoji, user_id: Snowflake) {
    match message.reactions.iter_mut().find(|r| r.emoji.same_as(emoji)) {
        Some(reaction) => {
            reaction.count += 1;
            reaction.users.push(user_id);
        }
        None => message.reactions.push(Reaction {
            count: 1,
            me: false,
            emoji: emoji.clone(),
            users: vec![user_id],
        }),
    }
}

fn remove_reaction(message: &mut Message, emoji: &Emoji, user_id: Snowflake) {
    if let Some(reaction) = message.reactions.iter_mut().find(|r| r.emoji.same_as(emoji)) {
        reaction.count -= 1;
        reaction.users.retain(|u| *u != user_id);
        if reaction.count <= 0 {
            message.reactions.retain(|r| !r.emoji.same_as(emoji));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message_create(cache: &CacheClient, id: u64, content: &str) {
        apply(
            cache,
            GatewayEvent::MESSAGE_CREATE,
            &json!({
                "id": id.to_string(),
                "channel_id": "10",
                "content": content,
                "author": {"id": "99", "username": "aya", "discriminator": "0001"},
            }),
        );
    }

    #[test]
    fn a_message_lifecycle_flows_through_the_cache() {
        let cache = CacheClient::new();

        message_create(&cache, 1, "hello");
        assert_eq!(cache.messages.len(), 1);
        let stored = cache.messages.get(&Snowflake(1)).unwrap();
        assert_eq!(stored.content, "hello");

        apply(
            &cache,
            GatewayEvent::MESSAGE_REACTION_ADD,
            &json!({
                "user_id": "99",
                "channel_id": "10",
                "message_id": "1",
                "emoji": {"id": null, "name": "👍"},
            }),
        );
        let stored = cache.messages.get(&Snowflake(1)).unwrap();
        assert_eq!(stored.reactions.len(), 1);
        assert_eq!(stored.reactions[0].count, 1);
        assert_eq!(stored.reactions[0].users, vec![Snowflake(99)]);

        apply(
            &cache,
            GatewayEvent::MESSAGE_DELETE,
            &json!({"id": "1", "channel_id": "10"}),
        );
        assert!(!cache.messages.has(&Snowflake(1)));
    }

    #[test]
    fn repeated_reactions_increment_the_count() {
        let cache = CacheClient::new();
        message_create(&cache, 1, "hi");
        for user in &["4", "5"] {
            apply(
                &cache,
                GatewayEvent::MESSAGE_REACTION_ADD,
                &json!({
                    "user_id": user,
                    "channel_id": "10",
                    "message_id": "1",
                    "emoji": {"id": null, "name": "🎉"},
                }),
            );
        }
        let stored = cache.messages.get(&Snowflake(1)).unwrap();
        assert_eq!(stored.reactions[0].count, 2);

        apply(
            &cache,
            GatewayEvent::MESSAGE_REACTION_REMOVE,
            &json!({
                "user_id": "4",
                "channel_id": "10",
                "message_id": "1",
                "emoji": {"id": null, "name": "🎉"},
            }),
        );
        let stored = cache.messages.get(&Snowflake(1)).unwrap();
        assert_eq!(stored.reactions[0].count, 1);
        assert_eq!(stored.reactions[0].users, vec![Snowflake(5)]);
    }

    #[test]
    fn guild_create_fans_out_into_the_other_stores() {
        let cache = CacheClient::new();
        apply(
            &cache,
            GatewayEvent::GUILD_CREATE,
            &json!({
                "id": "7",
                "name": "den",
                "owner_id": "99",
                "channels": [{"id": "10", "name": "general"}],
                "members": [{
                    "user": {"id": "99", "username": "aya", "discriminator": "0001"},
                    "roles": ["3"],
                    "nick": "ayaya",
                }],
            }),
        );

        assert!(cache.guilds.has(&Snowflake(7)));
        let channel = cache.channels.get(&Snowflake(10)).unwrap();
        assert_eq!(channel.guild_id, Some(Snowflake(7)));
        let entry = cache.guild_users.get(&(Snowflake(7), Snowflake(99))).unwrap();
        assert_eq!(entry.nickname.as_deref(), Some("ayaya"));
        assert_eq!(entry.roles, vec![Snowflake(3)]);
        assert!(cache.users.has(&Snowflake(99)));
        // the embedded collections are not kept on the stored guild
        assert!(cache.guilds.get(&Snowflake(7)).unwrap().members.is_empty());
    }

    #[test]
    fn presence_and_typing_create_entries_on_demand() {
        let cache = CacheClient::new();
        apply(
            &cache,
            GatewayEvent::PRESENCE_UPDATE,
            &json!({
                "user": {"id": "5"},
                "guild_id": "7",
                "status": "idle",
                "roles": ["1"],
            }),
        );
        let entry = cache.guild_users.get(&(Snowflake(7), Snowflake(5))).unwrap();
        assert_eq!(entry.status, accord_model::presence::Status::Idle);

        apply(
            &cache,
            GatewayEvent::TYPING_START,
            &json!({"channel_id": "10", "user_id": "5", "timestamp": 1554654321}),
        );
        let entry = cache.channel_users.get(&(Snowflake(10), Snowflake(5))).unwrap();
        assert_eq!(entry.last_typing, Some(1554654321));
    }

    #[test]
    fn guild_delete_marks_the_guild_unavailable() {
        let cache = CacheClient::new();
        apply(&cache, GatewayEvent::GUILD_CREATE, &json!({"id": "7", "name": "den"}));
        apply(&cache, GatewayEvent::GUILD_DELETE, &json!({"id": "7", "unavailable": true}));
        assert!(cache.guilds.get(&Snowflake(7)).unwrap().unavailable);
    }

    #[test]
    fn voice_states_are_keyed_by_the_full_triple() {
        let cache = CacheClient::new();
        apply(
            &cache,
            GatewayEvent::VOICE_STATE_UPDATE,
            &json!({
                "guild_id": "7",
                "channel_id": "11",
                "user_id": "5",
                "session_id": "abc",
                "deaf": false,
            }),
        );
        let key = (Snowflake(7), Some(Snowflake(11)), Snowflake(5));
        assert_eq!(cache.voice_states.get(&key).unwrap().session_id, "abc");
    }
}
