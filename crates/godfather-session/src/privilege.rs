//! Who counts as a game administrator.

use godfather_protocol::Player;

/// Returns `true` if the player may use the admin console.
///
/// Any single match grants admin:
/// - the `admin` role or the Godfather role ([`Role::is_privileged`])
/// - the reserved numeric id `0` or the reserved text id `"admin-uuid"`
///   ([`PlayerId::is_admin_sentinel`])
///
/// This is derived from the cached record every time and never stored.
///
/// [`Role::is_privileged`]: godfather_protocol::Role::is_privileged
/// [`PlayerId::is_admin_sentinel`]: godfather_protocol::PlayerId::is_admin_sentinel
pub fn is_admin(player: &Player) -> bool {
    player.role.is_privileged() || player.player_id.is_admin_sentinel()
}
