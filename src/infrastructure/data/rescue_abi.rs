// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Bindings for the RescueLog ledger contract and the ERC-4337 pieces a rescue
//! user operation touches (EntryPoint v0.7, SimpleAccount, SimpleAccountFactory).

use alloy::sol;

sol! {
    #[sol(abi)]
    #[derive(Debug, PartialEq, Eq)]
    interface RescueLog {
        function logRescue(
            string[] calldata symbols,
            uint256 totalWeight,
            bool byAgent,
            bytes32 selectionHash
        ) external;

        function getCounts(string[] calldata symbols) external view returns (uint256[] memory counts);
        function getAgentCounts(string[] calldata symbols) external view returns (uint256[] memory counts);

        function getLastRescue(address user) external view returns (
            bytes32 selectionHash,
            string[] memory symbols,
            uint256 totalWeight,
            bool byAgent,
            uint64 timestamp
        );

        function getUserStats(address user) external view returns (
            uint256 totalUserRescues,
            uint256 agentUserRescues,
            uint64 lastRescueTime,
            bool lastWasByAgent
        );

        function getGlobalStats() external view returns (
            uint256 total,
            uint256 agentTotal,
            uint256 uniqueSymbols
        );

        event Rescued(
            address indexed by,
            bytes32 selectionHash,
            string[] symbols,
            uint256 totalWeight,
            bool byAgent
        );
    }

    #[derive(Debug, PartialEq, Eq)]
    interface EntryPointV07 {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface SimpleAccount {
        function execute(address dest, uint256 value, bytes calldata func) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface SimpleAccountFactory {
        function createAccount(address owner, uint256 salt) external returns (address ret);
        function getAddress(address owner, uint256 salt) external view returns (address);
    }
}
