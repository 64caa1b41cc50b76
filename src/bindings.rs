use alloy::{
    primitives::{address, Address},
    sol,
};

/// `ArbOwner` precompile, present on every Arbitrum chain.
pub const ARB_OWNER: Address = address!("0000000000000000000000000000000000000070");

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ArbOwner {
        function isChainOwner(address addr) external view returns (bool);
        function setMinimumL2BaseFee(uint256 priceInWei) external;
        function setNetworkFeeAccount(address newNetworkFeeAccount) external;
        function setInfraFeeAccount(address newInfraFeeAccount) external;
        function setL1PricePerUnit(uint256 pricePerUnit) external;
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IInbox {
        function depositEth() external payable returns (uint256);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20Inbox {
        function depositERC20(uint256 amount) external returns (uint256);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
);
