// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Addresses and bindings of the two presale contracts.

use std::fmt;

use alloy::{
    primitives::{address, Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    #[sol(rpc)]
    interface WelpToken {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface WelpTokenSale {
        function buyTokens(uint256 numTokens) external payable;
        function sellTokens(uint256 numTokens) external;
        function buyPrice() external view returns (uint256);
        function sellPrice() external view returns (uint256);
    }
}

pub const TOKEN_ADDRESS: Address = address!("b79DA8e01c761D08B2dAAe5c2A9c51e0ace012ed");
pub const SALE_ADDRESS: Address = address!("19B961BE6CAC93e13988E67FCEAC43FB75F2AD58");

pub const TOKEN_SYMBOL: &str = "WELP";

/// Maximum number of whole tokens offered in the presale.
pub const PRESALE_CAP_TOKENS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRegistry {
    pub token: Address,
    pub sale: Address,
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self {
            token: TOKEN_ADDRESS,
            sale: SALE_ADDRESS,
        }
    }
}

/// Which of the two contracts a function lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Token,
    Sale,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => f.write_str("token"),
            Self::Sale => f.write_str("sale"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    View,
    NonPayable,
    Payable,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => f.write_str("view"),
            Self::NonPayable => f.write_str("nonpayable"),
            Self::Payable => f.write_str("payable"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionInfo {
    pub contract: ContractKind,
    pub signature: &'static str,
    pub mutability: Mutability,
}

impl ContractRegistry {
    pub fn address_of(&self, contract: ContractKind) -> Address {
        match contract {
            ContractKind::Token => self.token,
            ContractKind::Sale => self.sale,
        }
    }

    /// Every function the client is allowed to call.
    pub fn functions() -> [FunctionInfo; 8] {
        use ContractKind::*;
        use Mutability::*;
        [
            info(Token, WelpToken::totalSupplyCall::SIGNATURE, View),
            info(Token, WelpToken::balanceOfCall::SIGNATURE, View),
            info(Token, WelpToken::decimalsCall::SIGNATURE, View),
            info(Token, WelpToken::approveCall::SIGNATURE, NonPayable),
            info(Sale, WelpTokenSale::buyTokensCall::SIGNATURE, Payable),
            info(Sale, WelpTokenSale::sellTokensCall::SIGNATURE, NonPayable),
            info(Sale, WelpTokenSale::buyPriceCall::SIGNATURE, View),
            info(Sale, WelpTokenSale::sellPriceCall::SIGNATURE, View),
        ]
    }
}

fn info(contract: ContractKind, signature: &'static str, mutability: Mutability) -> FunctionInfo {
    FunctionInfo {
        contract,
        signature,
        mutability,
    }
}

/// A state-changing call the client may ask the wallet to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresaleCall {
    Approve { spender: Address, amount: U256 },
    BuyTokens { num_tokens: U256 },
    SellTokens { num_tokens: U256 },
}

impl PresaleCall {
    pub fn contract(&self) -> ContractKind {
        match self {
            Self::Approve { .. } => ContractKind::Token,
            Self::BuyTokens { .. } | Self::SellTokens { .. } => ContractKind::Sale,
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            Self::Approve { .. } => WelpToken::approveCall::SIGNATURE,
            Self::BuyTokens { .. } => WelpTokenSale::buyTokensCall::SIGNATURE,
            Self::SellTokens { .. } => WelpTokenSale::sellTokensCall::SIGNATURE,
        }
    }

    pub fn calldata(&self) -> Bytes {
        match *self {
            Self::Approve { spender, amount } => {
                WelpToken::approveCall { spender, amount }.abi_encode()
            }
            Self::BuyTokens { num_tokens } => {
                WelpTokenSale::buyTokensCall {
                    numTokens: num_tokens,
                }
                .abi_encode()
            }
            Self::SellTokens { num_tokens } => {
                WelpTokenSale::sellTokensCall {
                    numTokens: num_tokens,
                }
                .abi_encode()
            }
        }
        .into()
    }
}

/// A call plus the native value attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub call: PresaleCall,
    pub value: U256,
}

impl Submission {
    pub fn new(call: PresaleCall) -> Self {
        Self {
            call,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}
