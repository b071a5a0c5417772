//! Shared fixture: a small game module with an inheritance chain, an
//! interface, an enum, a struct, field links and call sites.

#![allow(dead_code)]

use std::sync::Arc;

use cilquery::metadata::body::opcodes;
use cilquery::metadata::types::ConstantValue;
use cilquery::prelude::*;
use uguid::guid;

/// MVID of the fixture module.
pub const GAME_MVID: uguid::Guid = guid!("11111111-2222-3333-4444-555555555555");

pub const TOKEN_COLOR: u32 = 0x0200_0001;
pub const TOKEN_IENTITY: u32 = 0x0200_0002;
pub const TOKEN_ACTOR: u32 = 0x0200_0003;
pub const TOKEN_INVENTORY: u32 = 0x0200_0004;
pub const TOKEN_PLAYER: u32 = 0x0200_0005;
pub const TOKEN_WORLD: u32 = 0x0200_0006;
pub const TOKEN_VEC2: u32 = 0x0200_0007;
pub const TOKEN_LOOSE: u32 = 0x0200_0008;

pub const TOKEN_IENTITY_UPDATE: u32 = 0x0600_0010;
pub const TOKEN_ACTOR_UPDATE: u32 = 0x0600_0020;
pub const TOKEN_ACTOR_GET_HEALTH: u32 = 0x0600_0021;
pub const TOKEN_PLAYER_UPDATE: u32 = 0x0600_0030;
pub const TOKEN_PLAYER_RESPAWN: u32 = 0x0600_0031;

pub const TOKEN_ACTOR_NAME: u32 = 0x0400_0020;
pub const TOKEN_PLAYER_INVENTORY: u32 = 0x0400_0030;
pub const TOKEN_WORLD_PLAYER: u32 = 0x0400_0040;

/// Builds the fixture workspace.
pub fn game_workspace() -> Arc<Workspace> {
    let workspace = Arc::new(Workspace::new());
    let module = ModuleBuilder::new("game.dll", GAME_MVID)
        .path("/opt/game/game.dll")
        .assembly("Game", "1.2.0.0")
        .assembly_ref("mscorlib", "4.0.0.0")
        .resource("Game.Assets.levels", "embedded")
        .build();

    // enum Game.Color : System.Enum { Red = 0, Green = 1 }
    TypeBuilder::new(TOKEN_COLOR, "Color", "Game")
        .flags(TypeFlags::ENUM | TypeFlags::VALUE_TYPE | TypeFlags::PUBLIC)
        .base(CilTypeRef::named("System.Enum"))
        .field(FieldBuilder::new(
            0x0400_0001,
            "value__",
            TypeSig::named("System.Int32"),
        ))
        .field(
            FieldBuilder::new(0x0400_0002, "Red", TypeSig::named("Game.Color"))
                .flags(FieldFlags::STATIC | FieldFlags::LITERAL)
                .constant(ConstantValue::Int(0)),
        )
        .field(
            FieldBuilder::new(0x0400_0003, "Green", TypeSig::named("Game.Color"))
                .flags(FieldFlags::STATIC | FieldFlags::LITERAL)
                .constant(ConstantValue::Int(1)),
        )
        .register(&module);

    // interface Game.IEntity { void Update(float dt); }
    let ientity = TypeBuilder::new(TOKEN_IENTITY, "IEntity", "Game")
        .flags(TypeFlags::INTERFACE | TypeFlags::ABSTRACT | TypeFlags::PUBLIC)
        .method(
            MethodBuilder::new(TOKEN_IENTITY_UPDATE, "Update")
                .flags(MethodFlags::PUBLIC | MethodFlags::ABSTRACT | MethodFlags::VIRTUAL)
                .param("dt", TypeSig::named("System.Single")),
        )
        .register(&module);

    // class Game.Actor : System.Object, IEntity
    let actor = TypeBuilder::new(TOKEN_ACTOR, "Actor", "Game")
        .flags(TypeFlags::PUBLIC)
        .base(CilTypeRef::named("System.Object"))
        .implements(CilTypeRef::to(&ientity))
        .field(FieldBuilder::new(
            TOKEN_ACTOR_NAME,
            "Name",
            TypeSig::named("System.String"),
        ))
        .method(
            MethodBuilder::new(TOKEN_ACTOR_UPDATE, "Update")
                .flags(MethodFlags::PUBLIC | MethodFlags::VIRTUAL)
                .param("dt", TypeSig::named("System.Single")),
        )
        .method(
            MethodBuilder::new(TOKEN_ACTOR_GET_HEALTH, "get_Health")
                .flags(MethodFlags::PUBLIC)
                .returns(TypeSig::named("System.Int32")),
        )
        .property(
            PropertyBuilder::new(0x1700_0001, "Health", TypeSig::named("System.Int32"))
                .getter("get_Health"),
        )
        .register(&module);

    // class Game.Inventory
    let inventory = TypeBuilder::new(TOKEN_INVENTORY, "Inventory", "Game")
        .flags(TypeFlags::PUBLIC)
        .base(CilTypeRef::named("System.Object"))
        .register(&module);

    let actor_update = module
        .resolve_token(Token::new(TOKEN_ACTOR_UPDATE))
        .and_then(|def| def.as_method())
        .expect("fixture: Actor::Update");
    let actor_name = module
        .resolve_token(Token::new(TOKEN_ACTOR_NAME))
        .and_then(|def| def.as_field())
        .expect("fixture: Actor::Name");

    // class Game.Player : Game.Actor - overrides Update by name+signature
    let player = TypeBuilder::new(TOKEN_PLAYER, "Player", "Game")
        .flags(TypeFlags::PUBLIC)
        .base(CilTypeRef::to(&actor))
        .field(FieldBuilder::new(
            TOKEN_PLAYER_INVENTORY,
            "inventory",
            TypeSig::of(&inventory),
        ))
        .method(
            MethodBuilder::new(TOKEN_PLAYER_UPDATE, "Update")
                .flags(MethodFlags::PUBLIC | MethodFlags::VIRTUAL)
                .param("dt", TypeSig::named("System.Single")),
        )
        .method(
            MethodBuilder::new(TOKEN_PLAYER_RESPAWN, "Respawn")
                .flags(MethodFlags::PUBLIC)
                .instructions(vec![
                    Instruction::new(
                        0,
                        opcodes::LDSTR,
                        Operand::String("player respawned".to_string()),
                    ),
                    Instruction::new(
                        5,
                        opcodes::CALLVIRT,
                        Operand::Method(MemberLink::new(&actor_update.full_name, &actor_update)),
                    ),
                    Instruction::new(
                        10,
                        opcodes::LDFLD,
                        Operand::Field(MemberLink::new(&actor_name.full_name, &actor_name)),
                    ),
                    Instruction::new(
                        15,
                        opcodes::STFLD,
                        Operand::Field(MemberLink::new(&actor_name.full_name, &actor_name)),
                    ),
                    Instruction::new(20, opcodes::RET, Operand::None),
                ]),
        )
        .register(&module);

    // class Game.World { Player player; }
    TypeBuilder::new(TOKEN_WORLD, "World", "Game")
        .flags(TypeFlags::PUBLIC)
        .base(CilTypeRef::named("System.Object"))
        .field(FieldBuilder::new(
            TOKEN_WORLD_PLAYER,
            "player",
            TypeSig::of(&player),
        ))
        .register(&module);

    // struct Game.Vec2
    TypeBuilder::new(TOKEN_VEC2, "Vec2", "Game")
        .flags(TypeFlags::VALUE_TYPE | TypeFlags::PUBLIC | TypeFlags::SEQUENTIAL_LAYOUT)
        .base(CilTypeRef::named("System.ValueType"))
        .field(FieldBuilder::new(
            0x0400_0050,
            "X",
            TypeSig::named("System.Single"),
        ))
        .field(FieldBuilder::new(
            0x0400_0051,
            "Y",
            TypeSig::named("System.Single"),
        ))
        .register(&module);

    // One type in the global namespace.
    TypeBuilder::new(TOKEN_LOOSE, "Loose", "")
        .flags(TypeFlags::PUBLIC)
        .base(CilTypeRef::named("System.Object"))
        .register(&module);

    workspace.insert(module);
    workspace
}

/// Fixture MVID as envelope text.
pub fn game_mvid_text() -> String {
    GAME_MVID.to_string()
}

/// A decompiler stub that echoes the resolved definition's name.
pub struct StubDecompiler;

impl Decompiler for StubDecompiler {
    fn language(&self) -> &str {
        "C#"
    }

    fn decompile(&self, target: &DecompileTarget) -> cilquery::Result<String> {
        let text = match target {
            DecompileTarget::Method(m) => format!("// method {}", m.full_name),
            DecompileTarget::Field(f) => format!("// field {}", f.full_name),
            DecompileTarget::Property(p) => format!("// property {}", p.full_name),
            DecompileTarget::Event(e) => format!("// event {}", e.full_name),
            DecompileTarget::Type(t) => format!("// type {}", t.full_name),
        };
        Ok(text)
    }
}
